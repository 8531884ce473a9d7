//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{NewUser, PermissionCode, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The operation exceeded its deadline.
        Timeout { operation: String } => "user repository timed out during {operation}",
        /// Another account already uses this address.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and grant `permissions` in one transaction.
    async fn insert_with_permissions(
        &self,
        user: &NewUser,
        permissions: &[PermissionCode],
    ) -> Result<User, UserRepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Increment the user's session epoch and return the new value, or
    /// `None` when no such user exists.
    async fn advance_session_epoch(&self, id: i64) -> Result<Option<i32>, UserRepositoryError>;
}
