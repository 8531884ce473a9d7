//! Domain primitives, aggregates and use-case services.
//!
//! Purpose: define the catalogue entities (roasters, beans), accounts and
//! permissions, the validation and search rules that guard them, and the
//! services that drive the persistence ports. Nothing here knows about HTTP
//! or SQL.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: domain error payload and stable codes.
//! - [`Validator`] / [`FormError`]: per-field form validation results.
//! - [`SearchQuery`] / [`SortDirective`]: validated search and ordering.
//! - [`RoasterService`], [`BeanService`], [`AccountService`]: use-cases.

pub mod account_service;
pub mod auth;
pub mod bean;
pub mod bean_service;
pub mod error;
pub mod password;
pub mod permissions;
pub mod ports;
pub mod roaster;
pub mod roaster_service;
pub mod search;
pub mod trace_id;
pub mod user;
pub mod validator;

pub use self::account_service::{
    AccountService, DUPLICATE_EMAIL, INVALID_CREDENTIALS, LoginError,
};
pub use self::auth::{LoginCredentials, LoginForm, SignupDraft, SignupForm};
pub use self::bean::{
    Bean, BeanDetail, BeanDraft, BeanForm, BeanListing, BeanSortColumn, RoastLevel,
    UnknownRoastLevel,
};
pub use self::bean_service::BeanService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::permissions::{
    BEANS_READ, BEANS_WRITE, DEFAULT_PERMISSIONS, PermissionCode, PermissionCodeError,
    Permissions, ROASTERS_READ, ROASTERS_WRITE, WRITER_PERMISSIONS,
};
pub use self::roaster::{Roaster, RoasterDetail, RoasterDraft, RoasterForm, RoasterSortColumn};
pub use self::roaster_service::RoasterService;
pub use self::search::{
    SearchParams, SearchQuery, SortColumn, SortDirection, SortDirective, SortError,
};
pub use self::trace_id::TraceId;
pub use self::user::{CurrentUser, NewUser, User};
pub use self::validator::{FormError, Validator};
