//! Port for bean persistence.

use async_trait::async_trait;

use crate::domain::{Bean, BeanDraft, BeanSortColumn, SearchQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by bean repository adapters.
    pub enum BeanRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "bean repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "bean repository query failed: {message}",
        /// The operation exceeded its deadline.
        Timeout { operation: String } => "bean repository timed out during {operation}",
        /// No bean has this id.
        NotFound { id: i64 } => "bean {id} not found",
        /// The bean exists but at a different version.
        EditConflict { id: i64, expected: i32, actual: i32 } =>
            "bean {id} was modified: expected version {expected}, found {actual}",
        /// `roaster_id` does not reference an existing roaster.
        InvalidReference { roaster_id: i64 } => "roaster {roaster_id} does not exist",
    }
}

/// Bean storage with the same version semantics as roasters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BeanRepository: Send + Sync {
    async fn list(
        &self,
        query: &SearchQuery<BeanSortColumn>,
    ) -> Result<Vec<Bean>, BeanRepositoryError>;

    /// Beans produced by one roaster, ordered by id.
    async fn list_by_roaster(&self, roaster_id: i64) -> Result<Vec<Bean>, BeanRepositoryError>;

    async fn find(&self, id: i64) -> Result<Option<Bean>, BeanRepositoryError>;

    async fn insert(&self, draft: &BeanDraft) -> Result<Bean, BeanRepositoryError>;

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &BeanDraft,
    ) -> Result<Bean, BeanRepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), BeanRepositoryError>;
}
