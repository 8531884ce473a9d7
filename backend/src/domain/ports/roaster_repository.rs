//! Port for roaster persistence.

use async_trait::async_trait;

use crate::domain::{Roaster, RoasterDraft, RoasterSortColumn, SearchQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by roaster repository adapters.
    pub enum RoasterRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "roaster repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "roaster repository query failed: {message}",
        /// The operation exceeded its deadline.
        Timeout { operation: String } => "roaster repository timed out during {operation}",
        /// No roaster has this id.
        NotFound { id: i64 } => "roaster {id} not found",
        /// The roaster exists but at a different version.
        EditConflict { id: i64, expected: i32, actual: i32 } =>
            "roaster {id} was modified: expected version {expected}, found {actual}",
    }
}

/// Roaster storage.
///
/// `update` is a compare-and-swap on `version`: it only applies when the
/// stored version equals `expected_version`, and it bumps the version by one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoasterRepository: Send + Sync {
    /// Roasters matching every word of the term, in the requested order.
    async fn list(
        &self,
        query: &SearchQuery<RoasterSortColumn>,
    ) -> Result<Vec<Roaster>, RoasterRepositoryError>;

    async fn find(&self, id: i64) -> Result<Option<Roaster>, RoasterRepositoryError>;

    /// Insert a roaster and return it with server-assigned fields.
    async fn insert(&self, draft: &RoasterDraft) -> Result<Roaster, RoasterRepositoryError>;

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &RoasterDraft,
    ) -> Result<Roaster, RoasterRepositoryError>;

    /// Delete a roaster and, through the foreign key, its beans.
    async fn delete(&self, id: i64) -> Result<(), RoasterRepositoryError>;
}
