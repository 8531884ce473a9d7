//! Bean use-cases.
//!
//! A bean always belongs to an existing roaster. A dangling `roaster_id` is
//! reported against the form field so the user can pick another roaster.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::ports::{BeanRepository, BeanRepositoryError, RoasterRepository};
use crate::domain::roaster_service::{map_bean_error, map_roaster_error};
use crate::domain::{
    Bean, BeanDetail, BeanForm, BeanListing, BeanSortColumn, Error, FormError, Roaster,
    RoasterSortColumn, SearchQuery, SortDirection, SortDirective,
};

const UNKNOWN_ROASTER: &str = "this field must reference an existing roaster";

/// Bean service backed by the bean and roaster ports.
#[derive(Clone)]
pub struct BeanService {
    beans: Arc<dyn BeanRepository>,
    roasters: Arc<dyn RoasterRepository>,
}

fn map_bean_form_error(error: BeanRepositoryError) -> FormError {
    match error {
        BeanRepositoryError::InvalidReference { .. } => FormError::field("roaster_id", UNKNOWN_ROASTER),
        other => FormError::Failed(map_bean_error(other)),
    }
}

impl BeanService {
    pub fn new(beans: Arc<dyn BeanRepository>, roasters: Arc<dyn RoasterRepository>) -> Self {
        Self { beans, roasters }
    }

    pub async fn list(&self, query: &SearchQuery<BeanSortColumn>) -> Result<Vec<Bean>, Error> {
        self.beans.list(query).await.map_err(map_bean_error)
    }

    /// Matching beans with their roasters' names; each roaster is read once.
    pub async fn list_with_roasters(
        &self,
        query: &SearchQuery<BeanSortColumn>,
    ) -> Result<Vec<BeanListing>, Error> {
        let beans = self.list(query).await?;
        let roaster_ids: BTreeSet<i64> = beans.iter().map(|bean| bean.roaster_id).collect();
        let mut names = BTreeMap::new();
        for roaster_id in roaster_ids {
            if let Some(roaster) = self
                .roasters
                .find(roaster_id)
                .await
                .map_err(map_roaster_error)?
            {
                names.insert(roaster_id, roaster.name);
            }
        }
        Ok(beans
            .into_iter()
            .map(|bean| BeanListing {
                roaster_name: names.get(&bean.roaster_id).cloned(),
                bean,
            })
            .collect())
    }

    pub async fn find(&self, id: i64) -> Result<Bean, Error> {
        self.beans
            .find(id)
            .await
            .map_err(map_bean_error)?
            .ok_or_else(|| Error::not_found(format!("bean {id} not found")))
    }

    /// A bean with the roaster that produces it.
    pub async fn detail(&self, id: i64) -> Result<BeanDetail, Error> {
        let bean = self.find(id).await?;
        let roaster = self
            .roasters
            .find(bean.roaster_id)
            .await
            .map_err(map_roaster_error)?
            .ok_or_else(|| {
                Error::internal(format!(
                    "bean {id} references missing roaster {}",
                    bean.roaster_id
                ))
            })?;
        Ok(BeanDetail { bean, roaster })
    }

    /// Every roaster, ordered by name, for the bean form's select box.
    pub async fn roaster_options(&self) -> Result<Vec<Roaster>, Error> {
        let query = SearchQuery::new(
            "",
            SortDirective::new(RoasterSortColumn::Name, SortDirection::Asc),
        );
        self.roasters.list(&query).await.map_err(map_roaster_error)
    }

    pub async fn create(&self, form: &BeanForm) -> Result<Bean, FormError> {
        let draft = form.validate()?;
        let bean = self.beans.insert(&draft).await.map_err(map_bean_form_error)?;
        tracing::info!(bean_id = bean.id, roaster_id = bean.roaster_id, "bean created");
        Ok(bean)
    }

    /// Apply `form` if the stored version still equals `expected_version`.
    pub async fn update(
        &self,
        id: i64,
        expected_version: i32,
        form: &BeanForm,
    ) -> Result<Bean, FormError> {
        let draft = form.validate()?;
        let bean = self
            .beans
            .update(id, expected_version, &draft)
            .await
            .map_err(map_bean_form_error)?;
        tracing::info!(bean_id = id, version = bean.version, "bean updated");
        Ok(bean)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        self.beans.delete(id).await.map_err(map_bean_error)?;
        tracing::info!(bean_id = id, "bean deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "bean_service_tests.rs"]
mod tests;
