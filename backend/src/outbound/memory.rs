//! In-process adapters used when no database is configured.
//!
//! [`MemoryCatalogue`] serves both catalogue ports from one store so that the
//! roaster reference on beans and the delete cascade behave as they do in
//! PostgreSQL. [`MemoryAccounts`] does the same for users and their grants.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    BeanRepository, BeanRepositoryError, PermissionRepository, PermissionRepositoryError,
    RoasterRepository, RoasterRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    BEANS_READ, BEANS_WRITE, Bean, BeanDraft, BeanSortColumn, NewUser, PermissionCode,
    Permissions, ROASTERS_READ, ROASTERS_WRITE, Roaster, RoasterDraft, RoasterSortColumn,
    SearchQuery, SortDirection, User,
};

fn lock<T, E>(
    mutex: &Mutex<T>,
    on_poison: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'_, T>, E> {
    mutex
        .lock()
        .map_err(|_| on_poison("in-memory store lock poisoned".to_owned()))
}

fn ordered<T>(
    rows: &mut [T],
    direction: SortDirection,
    key: impl Fn(&T, &T) -> Ordering,
    id: impl Fn(&T) -> i64,
) {
    rows.sort_by(|a, b| {
        let primary = match direction {
            SortDirection::Asc => key(a, b),
            SortDirection::Desc => key(b, a),
        };
        primary.then_with(|| id(a).cmp(&id(b)))
    });
}

#[derive(Debug, Default)]
struct CatalogueState {
    roasters: BTreeMap<i64, Roaster>,
    beans: BTreeMap<i64, Bean>,
    last_roaster_id: i64,
    last_bean_id: i64,
}

/// Roaster and bean storage held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogue {
    state: Arc<Mutex<CatalogueState>>,
}

impl MemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoasterRepository for MemoryCatalogue {
    async fn list(
        &self,
        query: &SearchQuery<RoasterSortColumn>,
    ) -> Result<Vec<Roaster>, RoasterRepositoryError> {
        let state = lock(&self.state, RoasterRepositoryError::query)?;
        let mut rows: Vec<Roaster> = state
            .roasters
            .values()
            .filter(|r| query.matches(&format!("{} {} {}", r.name, r.description, r.location)))
            .cloned()
            .collect();
        let sort = query.sort();
        ordered(
            &mut rows,
            sort.direction(),
            |a, b| match sort.column() {
                RoasterSortColumn::Id => a.id.cmp(&b.id),
                RoasterSortColumn::Name => a.name.cmp(&b.name),
                RoasterSortColumn::Location => a.location.cmp(&b.location),
            },
            |r| r.id,
        );
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Roaster>, RoasterRepositoryError> {
        let state = lock(&self.state, RoasterRepositoryError::query)?;
        Ok(state.roasters.get(&id).cloned())
    }

    async fn insert(&self, draft: &RoasterDraft) -> Result<Roaster, RoasterRepositoryError> {
        let mut state = lock(&self.state, RoasterRepositoryError::query)?;
        state.last_roaster_id += 1;
        let roaster = Roaster {
            id: state.last_roaster_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            website: draft.website.clone(),
            location: draft.location.clone(),
            created_at: Utc::now(),
            version: 1,
        };
        state.roasters.insert(roaster.id, roaster.clone());
        Ok(roaster)
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &RoasterDraft,
    ) -> Result<Roaster, RoasterRepositoryError> {
        let mut state = lock(&self.state, RoasterRepositoryError::query)?;
        let roaster = state
            .roasters
            .get_mut(&id)
            .ok_or_else(|| RoasterRepositoryError::not_found(id))?;
        if roaster.version != expected_version {
            return Err(RoasterRepositoryError::edit_conflict(
                id,
                expected_version,
                roaster.version,
            ));
        }
        roaster.name.clone_from(&draft.name);
        roaster.description.clone_from(&draft.description);
        roaster.website.clone_from(&draft.website);
        roaster.location.clone_from(&draft.location);
        roaster.version += 1;
        Ok(roaster.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RoasterRepositoryError> {
        let mut state = lock(&self.state, RoasterRepositoryError::query)?;
        if state.roasters.remove(&id).is_none() {
            return Err(RoasterRepositoryError::not_found(id));
        }
        state.beans.retain(|_, bean| bean.roaster_id != id);
        Ok(())
    }
}

#[async_trait]
impl BeanRepository for MemoryCatalogue {
    async fn list(
        &self,
        query: &SearchQuery<BeanSortColumn>,
    ) -> Result<Vec<Bean>, BeanRepositoryError> {
        let state = lock(&self.state, BeanRepositoryError::query)?;
        let mut rows: Vec<Bean> = state
            .beans
            .values()
            .filter(|b| query.matches(&format!("{} {}", b.name, b.roast_level)))
            .cloned()
            .collect();
        let sort = query.sort();
        ordered(
            &mut rows,
            sort.direction(),
            |a, b| match sort.column() {
                BeanSortColumn::Id => a.id.cmp(&b.id),
                BeanSortColumn::Name => a.name.cmp(&b.name),
                BeanSortColumn::RoastLevel => a.roast_level.as_str().cmp(b.roast_level.as_str()),
            },
            |b| b.id,
        );
        Ok(rows)
    }

    async fn list_by_roaster(&self, roaster_id: i64) -> Result<Vec<Bean>, BeanRepositoryError> {
        let state = lock(&self.state, BeanRepositoryError::query)?;
        Ok(state
            .beans
            .values()
            .filter(|bean| bean.roaster_id == roaster_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Bean>, BeanRepositoryError> {
        let state = lock(&self.state, BeanRepositoryError::query)?;
        Ok(state.beans.get(&id).cloned())
    }

    async fn insert(&self, draft: &BeanDraft) -> Result<Bean, BeanRepositoryError> {
        let mut state = lock(&self.state, BeanRepositoryError::query)?;
        if !state.roasters.contains_key(&draft.roaster_id) {
            return Err(BeanRepositoryError::invalid_reference(draft.roaster_id));
        }
        state.last_bean_id += 1;
        let bean = Bean {
            id: state.last_bean_id,
            name: draft.name.clone(),
            roast_level: draft.roast_level,
            roaster_id: draft.roaster_id,
            created_at: Utc::now(),
            version: 1,
        };
        state.beans.insert(bean.id, bean.clone());
        Ok(bean)
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &BeanDraft,
    ) -> Result<Bean, BeanRepositoryError> {
        let mut state = lock(&self.state, BeanRepositoryError::query)?;
        let roaster_exists = state.roasters.contains_key(&draft.roaster_id);
        let bean = state
            .beans
            .get_mut(&id)
            .ok_or_else(|| BeanRepositoryError::not_found(id))?;
        if bean.version != expected_version {
            return Err(BeanRepositoryError::edit_conflict(
                id,
                expected_version,
                bean.version,
            ));
        }
        if !roaster_exists {
            return Err(BeanRepositoryError::invalid_reference(draft.roaster_id));
        }
        bean.name.clone_from(&draft.name);
        bean.roast_level = draft.roast_level;
        bean.roaster_id = draft.roaster_id;
        bean.version += 1;
        Ok(bean.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), BeanRepositoryError> {
        let mut state = lock(&self.state, BeanRepositoryError::query)?;
        state
            .beans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BeanRepositoryError::not_found(id))
    }
}

#[derive(Debug, Default)]
struct AccountState {
    users: BTreeMap<i64, User>,
    grants: BTreeMap<i64, BTreeSet<PermissionCode>>,
    last_user_id: i64,
}

/// Users and permission grants held in memory.
///
/// Only the four seeded permission codes may be granted, as with the
/// `permissions` table.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccounts {
    state: Arc<Mutex<AccountState>>,
}

const SEEDED_CODES: [&str; 4] = [ROASTERS_READ, ROASTERS_WRITE, BEANS_READ, BEANS_WRITE];

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryAccounts {
    async fn insert_with_permissions(
        &self,
        user: &NewUser,
        permissions: &[PermissionCode],
    ) -> Result<User, UserRepositoryError> {
        if let Some(unknown) = permissions
            .iter()
            .find(|code| !SEEDED_CODES.contains(&code.as_str()))
        {
            return Err(UserRepositoryError::query(format!(
                "unknown permission codes: {unknown}"
            )));
        }
        let mut state = lock(&self.state, UserRepositoryError::query)?;
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(UserRepositoryError::duplicate_email(user.email.clone()));
        }
        state.last_user_id += 1;
        let stored = User::new(
            state.last_user_id,
            user.name.clone(),
            user.email.clone(),
            user.password_hash.clone(),
            user.activated,
            Utc::now(),
            1,
        );
        state.users.insert(stored.id, stored.clone());
        state
            .grants
            .insert(stored.id, permissions.iter().cloned().collect());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        let state = lock(&self.state, UserRepositoryError::query)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let state = lock(&self.state, UserRepositoryError::query)?;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn advance_session_epoch(&self, id: i64) -> Result<Option<i32>, UserRepositoryError> {
        let mut state = lock(&self.state, UserRepositoryError::query)?;
        Ok(state.users.get_mut(&id).map(|user| {
            user.session_epoch += 1;
            user.session_epoch
        }))
    }
}

#[async_trait]
impl PermissionRepository for MemoryAccounts {
    async fn for_user(&self, user_id: i64) -> Result<Permissions, PermissionRepositoryError> {
        let state = lock(&self.state, PermissionRepositoryError::query)?;
        Ok(state
            .grants
            .get(&user_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoastLevel, SortDirective};
    use rstest::rstest;

    fn roaster_draft(name: &str, location: &str) -> RoasterDraft {
        RoasterDraft {
            name: name.into(),
            description: "Dark roast specialists".into(),
            website: "https://example.com".into(),
            location: location.into(),
        }
    }

    fn catalogue() -> MemoryCatalogue {
        MemoryCatalogue::new()
    }

    #[tokio::test]
    async fn created_roasters_start_at_version_one() {
        let store = catalogue();
        let created = RoasterRepository::insert(&store, &roaster_draft("Ember", "Leeds"))
            .await
            .expect("insert");
        assert!(created.id > 0);
        assert_eq!(created.version, 1);
    }

    #[tokio::test]
    async fn stale_update_leaves_row_untouched() {
        let store = catalogue();
        let created = RoasterRepository::insert(&store, &roaster_draft("Ember", "Leeds"))
            .await
            .expect("insert");
        let updated = RoasterRepository::update(&store, created.id, 1, &roaster_draft("Ash", "York"))
            .await
            .expect("first update");
        assert_eq!(updated.version, 2);

        let err = RoasterRepository::update(&store, created.id, 1, &roaster_draft("Oak", "Hull"))
            .await
            .expect_err("stale");
        assert_eq!(err, RoasterRepositoryError::edit_conflict(created.id, 1, 2));
        let current = RoasterRepository::find(&store, created.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(current.name, "Ash");
    }

    #[tokio::test]
    async fn update_of_missing_roaster_is_not_found() {
        let err = RoasterRepository::update(&catalogue(), 42, 1, &roaster_draft("Ember", "Leeds"))
            .await
            .expect_err("missing");
        assert_eq!(err, RoasterRepositoryError::not_found(42));
    }

    #[tokio::test]
    async fn search_requires_every_word() {
        let store = catalogue();
        let mut light = roaster_draft("Dawn", "Bristol");
        light.description = "Light roast".into();
        RoasterRepository::insert(&store, &light).await.expect("insert");
        RoasterRepository::insert(&store, &roaster_draft("Ember", "Leeds"))
            .await
            .expect("insert");

        let query = SearchQuery::new("dark ROAST", SortDirective::default());
        let found = RoasterRepository::list(&store, &query).await.expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ember");

        let all = RoasterRepository::list(&store, &SearchQuery::default())
            .await
            .expect("list");
        assert_eq!(all.len(), 2);
    }

    #[rstest]
    #[case(SortDirection::Asc, ["Bristol", "Leeds", "York"])]
    #[case(SortDirection::Desc, ["York", "Leeds", "Bristol"])]
    #[tokio::test]
    async fn roasters_sort_by_location(
        #[case] direction: SortDirection,
        #[case] expected: [&str; 3],
    ) {
        let store = catalogue();
        for (name, location) in [("A", "Leeds"), ("B", "York"), ("C", "Bristol")] {
            RoasterRepository::insert(&store, &roaster_draft(name, location))
                .await
                .expect("insert");
        }
        let query = SearchQuery::new("", SortDirective::new(RoasterSortColumn::Location, direction));
        let rows = RoasterRepository::list(&store, &query).await.expect("list");
        let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, expected);
    }

    #[tokio::test]
    async fn beans_need_an_existing_roaster_and_cascade_on_delete() {
        let store = catalogue();
        let draft = BeanDraft {
            name: "Yirgacheffe".into(),
            roast_level: RoastLevel::Light,
            roaster_id: 99,
        };
        let err = BeanRepository::insert(&store, &draft).await.expect_err("dangling");
        assert_eq!(err, BeanRepositoryError::invalid_reference(99));

        let roaster = RoasterRepository::insert(&store, &roaster_draft("Ember", "Leeds"))
            .await
            .expect("roaster");
        let bean = BeanRepository::insert(
            &store,
            &BeanDraft {
                roaster_id: roaster.id,
                ..draft
            },
        )
        .await
        .expect("bean");

        RoasterRepository::delete(&store, roaster.id).await.expect("delete");
        assert_eq!(BeanRepository::find(&store, bean.id).await.expect("find"), None);
        assert_eq!(
            RoasterRepository::delete(&store, roaster.id).await,
            Err(RoasterRepositoryError::not_found(roaster.id))
        );
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            activated: true,
        }
    }

    fn code(raw: &str) -> PermissionCode {
        PermissionCode::new(raw).expect("valid code")
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let accounts = MemoryAccounts::new();
        accounts
            .insert_with_permissions(&new_user("ada@example.com"), &[])
            .await
            .expect("first");
        let err = accounts
            .insert_with_permissions(&new_user("ada@example.com"), &[])
            .await
            .expect_err("duplicate");
        assert_eq!(err, UserRepositoryError::duplicate_email("ada@example.com"));
    }

    #[tokio::test]
    async fn signup_grants_each_code_once() {
        let accounts = MemoryAccounts::new();
        let user = accounts
            .insert_with_permissions(
                &new_user("ada@example.com"),
                &[code(BEANS_READ), code(BEANS_WRITE), code(BEANS_READ)],
            )
            .await
            .expect("insert");

        let granted = accounts.for_user(user.id).await.expect("perms");
        assert!(granted.contains(BEANS_WRITE));
        assert!(!granted.contains(ROASTERS_WRITE));
        assert_eq!(granted.iter().count(), 2);
    }

    #[tokio::test]
    async fn session_epoch_advances_per_user() {
        let accounts = MemoryAccounts::new();
        let user = accounts
            .insert_with_permissions(&new_user("ada@example.com"), &[])
            .await
            .expect("insert");
        assert_eq!(user.session_epoch, 0);

        assert_eq!(accounts.advance_session_epoch(user.id).await, Ok(Some(1)));
        assert_eq!(accounts.advance_session_epoch(user.id).await, Ok(Some(2)));
        assert_eq!(accounts.advance_session_epoch(user.id + 1).await, Ok(None));
        let stored = accounts.find_by_id(user.id).await.expect("find").expect("present");
        assert_eq!(stored.session_epoch, 2);
    }

    #[tokio::test]
    async fn unseeded_codes_cannot_be_granted_at_signup() {
        let err = MemoryAccounts::new()
            .insert_with_permissions(&new_user("ada@example.com"), &[code("coffee:brew")])
            .await
            .expect_err("unknown code");
        assert!(matches!(err, UserRepositoryError::Query { .. }));
    }
}
