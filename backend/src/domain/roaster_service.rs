//! Roaster use-cases: list, show, create, edit, delete.

use std::sync::Arc;

use serde_json::json;

use crate::domain::ports::{
    BeanRepository, BeanRepositoryError, RoasterRepository, RoasterRepositoryError,
};
use crate::domain::{
    Error, FormError, Roaster, RoasterDetail, RoasterForm, RoasterSortColumn, SearchQuery,
};

/// Roaster service backed by the roaster and bean ports.
#[derive(Clone)]
pub struct RoasterService {
    roasters: Arc<dyn RoasterRepository>,
    beans: Arc<dyn BeanRepository>,
}

pub(crate) fn map_roaster_error(error: RoasterRepositoryError) -> Error {
    match error {
        RoasterRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("roaster repository unavailable: {message}"))
        }
        RoasterRepositoryError::Query { message } => {
            Error::internal(format!("roaster repository error: {message}"))
        }
        RoasterRepositoryError::Timeout { operation } => {
            Error::internal(format!("roaster repository timed out during {operation}"))
        }
        RoasterRepositoryError::NotFound { id } => Error::not_found(format!("roaster {id} not found")),
        RoasterRepositoryError::EditConflict {
            id,
            expected,
            actual,
        } => Error::conflict(
            "This roaster was changed by someone else. Reload it and apply your edits again.",
        )
        .with_details(json!({
            "id": id,
            "expectedVersion": expected,
            "actualVersion": actual,
            "code": "edit_conflict",
        })),
    }
}

pub(crate) fn map_bean_error(error: BeanRepositoryError) -> Error {
    match error {
        BeanRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("bean repository unavailable: {message}"))
        }
        BeanRepositoryError::Query { message } => {
            Error::internal(format!("bean repository error: {message}"))
        }
        BeanRepositoryError::Timeout { operation } => {
            Error::internal(format!("bean repository timed out during {operation}"))
        }
        BeanRepositoryError::NotFound { id } => Error::not_found(format!("bean {id} not found")),
        BeanRepositoryError::EditConflict {
            id,
            expected,
            actual,
        } => Error::conflict(
            "This bean was changed by someone else. Reload it and apply your edits again.",
        )
        .with_details(json!({
            "id": id,
            "expectedVersion": expected,
            "actualVersion": actual,
            "code": "edit_conflict",
        })),
        BeanRepositoryError::InvalidReference { roaster_id } => {
            Error::unprocessable(format!("roaster {roaster_id} does not exist"))
        }
    }
}

impl RoasterService {
    pub fn new(roasters: Arc<dyn RoasterRepository>, beans: Arc<dyn BeanRepository>) -> Self {
        Self { roasters, beans }
    }

    pub async fn list(&self, query: &SearchQuery<RoasterSortColumn>) -> Result<Vec<Roaster>, Error> {
        self.roasters.list(query).await.map_err(map_roaster_error)
    }

    /// A roaster by id, or `NotFound`.
    pub async fn find(&self, id: i64) -> Result<Roaster, Error> {
        self.roasters
            .find(id)
            .await
            .map_err(map_roaster_error)?
            .ok_or_else(|| Error::not_found(format!("roaster {id} not found")))
    }

    /// A roaster with its beans.
    pub async fn detail(&self, id: i64) -> Result<RoasterDetail, Error> {
        let roaster = self.find(id).await?;
        let beans = self
            .beans
            .list_by_roaster(id)
            .await
            .map_err(map_bean_error)?;
        Ok(RoasterDetail { roaster, beans })
    }

    pub async fn create(&self, form: &RoasterForm) -> Result<Roaster, FormError> {
        let draft = form.validate()?;
        let roaster = self
            .roasters
            .insert(&draft)
            .await
            .map_err(map_roaster_error)?;
        tracing::info!(roaster_id = roaster.id, "roaster created");
        Ok(roaster)
    }

    /// Apply `form` if the stored version still equals `expected_version`.
    pub async fn update(
        &self,
        id: i64,
        expected_version: i32,
        form: &RoasterForm,
    ) -> Result<Roaster, FormError> {
        let draft = form.validate()?;
        let roaster = self
            .roasters
            .update(id, expected_version, &draft)
            .await
            .map_err(map_roaster_error)?;
        tracing::info!(roaster_id = id, version = roaster.version, "roaster updated");
        Ok(roaster)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        self.roasters.delete(id).await.map_err(map_roaster_error)?;
        tracing::info!(roaster_id = id, "roaster deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "roaster_service_tests.rs"]
mod tests;
