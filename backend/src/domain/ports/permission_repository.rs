//! Port for reading a user's permission codes.

use async_trait::async_trait;

use crate::domain::Permissions;

use super::define_port_error;

define_port_error! {
    /// Errors raised by permission repository adapters.
    pub enum PermissionRepositoryError {
        Connection { message: String } => "permission repository connection failed: {message}",
        Query { message: String } => "permission repository query failed: {message}",
        Timeout { operation: String } => "permission repository timed out during {operation}",
    }
}

/// Permission lookups. Callers must not cache the result across requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn for_user(&self, user_id: i64) -> Result<Permissions, PermissionRepositoryError>;
}
