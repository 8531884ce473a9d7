//! Roastery library: a server-rendered catalogue of coffee roasters and beans.
//!
//! - [`domain`]: entities, validation, search rules and use-case services.
//! - [`inbound`]: the HTTP adapter rendering HTML and HTMX fragments.
//! - [`outbound`]: PostgreSQL and in-memory implementations of the ports.
//! - [`middleware`]: request tracing.
//! - [`settings`]: server and database configuration.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

pub use middleware::Trace;
