//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Signup inserts the account and its grants inside one transaction, so a
//! user never exists without their starting permissions.

use std::collections::BTreeSet;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, PermissionCode, User};

use super::diesel_helpers::{
    DieselFailure, USERS_EMAIL_KEY, classify_diesel_error, with_query_timeout,
};
use super::models::{NewUserPermissionRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{permissions, users, users_permissions};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, UserRepositoryError>>,
    ) -> Result<T, UserRepositoryError> {
        with_query_timeout(
            self.pool.query_timeout(),
            operation,
            future,
            UserRepositoryError::timeout,
        )
        .await
    }
}

/// Failures raised inside the signup transaction.
#[derive(Debug)]
enum SignupFailure {
    Diesel(diesel::result::Error),
    UnknownPermissions(Vec<String>),
}

impl From<diesel::result::Error> for SignupFailure {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(error.into_message())
}

/// Map Diesel errors; a violation of `users_email_key` becomes `DuplicateEmail`.
fn map_diesel_error(error: diesel::result::Error, email: Option<&str>) -> UserRepositoryError {
    match (classify_diesel_error(error), email) {
        (DieselFailure::Unique { constraint }, Some(email))
            if constraint.as_deref() == Some(USERS_EMAIL_KEY) =>
        {
            UserRepositoryError::duplicate_email(email)
        }
        (DieselFailure::Connection(message), _) => UserRepositoryError::connection(message),
        (DieselFailure::ForeignKey { .. }, _) => UserRepositoryError::query("foreign key violation"),
        (DieselFailure::Unique { .. }, _) => UserRepositoryError::query("unique violation"),
        (DieselFailure::Query(message), _) => UserRepositoryError::query(message),
    }
}

fn map_read_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(error, None)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert_with_permissions(
        &self,
        user: &NewUser,
        codes: &[PermissionCode],
    ) -> Result<User, UserRepositoryError> {
        // One row comes back per distinct code, so compare against a set.
        let wanted: Vec<String> = codes
            .iter()
            .map(|code| code.as_str().to_owned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.timed("insert user", async {
            let wanted: &[String] = &wanted;
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = conn
                .transaction(|conn| {
                    async move {
                        let row: UserRow = diesel::insert_into(users::table)
                            .values(NewUserRow {
                                name: &user.name,
                                email: &user.email,
                                password_hash: &user.password_hash,
                                activated: user.activated,
                            })
                            .returning(UserRow::as_returning())
                            .get_result(conn)
                            .await?;

                        let found: Vec<(i64, String)> = permissions::table
                            .filter(permissions::code.eq_any(wanted))
                            .select((permissions::id, permissions::code))
                            .load(conn)
                            .await?;
                        if found.len() != wanted.len() {
                            let missing = wanted
                                .iter()
                                .filter(|code| !found.iter().any(|(_, have)| have == *code))
                                .cloned()
                                .collect();
                            return Err(SignupFailure::UnknownPermissions(missing));
                        }

                        let grants: Vec<NewUserPermissionRow> = found
                            .iter()
                            .map(|(permission_id, _)| NewUserPermissionRow {
                                user_id: row.id,
                                permission_id: *permission_id,
                            })
                            .collect();
                        if !grants.is_empty() {
                            diesel::insert_into(users_permissions::table)
                                .values(&grants)
                                .execute(conn)
                                .await?;
                        }
                        Ok(row)
                    }
                    .scope_boxed()
                })
                .await
                .map_err(|failure: SignupFailure| match failure {
                    SignupFailure::Diesel(err) => map_diesel_error(err, Some(&user.email)),
                    SignupFailure::UnknownPermissions(missing) => UserRepositoryError::query(
                        format!("unknown permission codes: {}", missing.join(", ")),
                    ),
                })?;
            Ok(User::from(row))
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        self.timed("find user by id", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .find(id)
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_read_error)?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        self.timed("find user by email", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(email))
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_read_error)?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn advance_session_epoch(&self, id: i64) -> Result<Option<i32>, UserRepositoryError> {
        self.timed("advance session epoch", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::update(users::table.find(id))
                .set(users::session_epoch.eq(users::session_epoch + 1))
                .returning(users::session_epoch)
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_read_error)
        })
        .await
    }
}
