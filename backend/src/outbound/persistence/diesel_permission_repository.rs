//! PostgreSQL-backed `PermissionRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PermissionRepository, PermissionRepositoryError};
use crate::domain::{PermissionCode, Permissions};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, collect_rows, with_query_timeout};
use super::pool::DbPool;
use super::schema::{permissions, users_permissions};

/// Reads grants through the `users_permissions` join table.
#[derive(Clone)]
pub struct DieselPermissionRepository {
    pool: DbPool,
}

impl DieselPermissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> PermissionRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => PermissionRepositoryError::connection(message),
        DieselFailure::Query(message) => PermissionRepositoryError::query(message),
        DieselFailure::ForeignKey { .. } | DieselFailure::Unique { .. } => {
            PermissionRepositoryError::query("database error")
        }
    }
}

#[async_trait]
impl PermissionRepository for DieselPermissionRepository {
    async fn for_user(&self, user_id: i64) -> Result<Permissions, PermissionRepositoryError> {
        let fetch = async {
            let mut conn = self
                .pool
                .get()
                .await
                .map_err(|err| PermissionRepositoryError::connection(err.into_message()))?;
            let codes: Vec<String> = users_permissions::table
                .inner_join(permissions::table)
                .filter(users_permissions::user_id.eq(user_id))
                .select(permissions::code)
                .order_by(permissions::code.asc())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            let codes = collect_rows(
                codes
                    .into_iter()
                    .map(|code| PermissionCode::new(code).map_err(|err| err.to_string())),
                PermissionRepositoryError::query,
            )?;
            Ok(Permissions::new(codes))
        };
        with_query_timeout(
            self.pool.query_timeout(),
            "load permissions",
            fetch,
            PermissionRepositoryError::timeout,
        )
        .await
    }
}
