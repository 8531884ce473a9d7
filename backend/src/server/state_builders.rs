//! Builders wiring the services onto PostgreSQL or in-memory stores.

use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};

use roastery::domain::ports::{
    BeanRepository, PermissionRepository, RoasterRepository, UserRepository,
};
use roastery::domain::{AccountService, BeanService, RoasterService};
use roastery::inbound::http::state::HttpState;
use roastery::outbound::memory::{MemoryAccounts, MemoryCatalogue};
use roastery::outbound::persistence::{
    DbPool, DieselBeanRepository, DieselPermissionRepository, DieselRoasterRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// The four repository ports every service is built from.
pub(crate) struct Repositories {
    pub(crate) roasters: Arc<dyn RoasterRepository>,
    pub(crate) beans: Arc<dyn BeanRepository>,
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) permissions: Arc<dyn PermissionRepository>,
}

impl Repositories {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            roasters: Arc::new(DieselRoasterRepository::new(pool.clone())),
            beans: Arc::new(DieselBeanRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            permissions: Arc::new(DieselPermissionRepository::new(pool.clone())),
        }
    }

    fn memory() -> Self {
        let catalogue = MemoryCatalogue::new();
        let accounts = MemoryAccounts::new();
        Self {
            roasters: Arc::new(catalogue.clone()),
            beans: Arc::new(catalogue),
            users: Arc::new(accounts.clone()),
            permissions: Arc::new(accounts),
        }
    }
}

/// Select repositories: PostgreSQL when a pool is configured, memory otherwise.
pub(crate) fn build_repositories(pool: Option<&DbPool>) -> Repositories {
    match pool {
        Some(pool) => Repositories::diesel(pool),
        None => {
            info!("no database configured; using in-memory stores");
            Repositories::memory()
        }
    }
}

/// Wire the services; `writer_emails` sign up with write permissions.
pub(crate) fn http_state_from(repositories: Repositories, writer_emails: &[String]) -> HttpState {
    let Repositories {
        roasters,
        beans,
        users,
        permissions,
    } = repositories;
    HttpState::new(
        RoasterService::new(roasters.clone(), beans.clone()),
        BeanService::new(beans, roasters),
        AccountService::new(users, permissions).with_writers(writer_emails.iter().cloned()),
    )
}

/// Build the shared HTTP state for `config`.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    if config.db_pool.is_none() && config.writer_emails.is_empty() {
        warn!("in-memory stores without ROASTERY_WRITER_EMAILS: no account can edit the catalogue");
    }
    web::Data::new(http_state_from(
        build_repositories(config.db_pool.as_ref()),
        &config.writer_emails,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roastery::domain::{
        BEANS_WRITE, ROASTERS_WRITE, RoasterForm, SearchQuery, SignupForm,
    };
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn memory_state_round_trips_a_roaster() {
        let state = http_state_from(build_repositories(None), &[]);
        let form = RoasterForm {
            name: "Ember".into(),
            description: String::new(),
            website: "https://ember.example".into(),
            location: "Leeds".into(),
        };
        let created = state.roasters.create(&form).await.expect("create");
        let listed = state
            .roasters
            .list(&SearchQuery::default())
            .await
            .expect("list");
        assert_eq!(listed, vec![created]);
    }

    fn signup(email: &str) -> SignupForm {
        SignupForm {
            name: "Ada".into(),
            email: email.into(),
            password: "correct horse".into(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn configured_writers_can_edit_in_memory_mode() {
        let state = http_state_from(
            build_repositories(None),
            &["ada@example.com".to_owned()],
        );

        let writer = state
            .accounts
            .signup(&signup("ada@example.com"))
            .await
            .expect("writer signup");
        let reader = state
            .accounts
            .signup(&signup("grace@example.com"))
            .await
            .expect("reader signup");

        let granted = state.accounts.permissions(writer.id).await.expect("perms");
        assert!(granted.contains(ROASTERS_WRITE));
        assert!(granted.contains(BEANS_WRITE));
        let granted = state.accounts.permissions(reader.id).await.expect("perms");
        assert!(!granted.contains(ROASTERS_WRITE));
    }
}
