//! PostgreSQL-backed `BeanRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::warn;

use crate::domain::ports::{BeanRepository, BeanRepositoryError};
use crate::domain::{Bean, BeanDraft, BeanSortColumn, SearchQuery, SortDirection};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, with_query_timeout,
};
use super::models::{BeanFields, BeanRow};
use super::pool::{DbPool, PoolError};
use super::schema::beans;

const ROASTER_FKEY: &str = "beans_roaster_id_fkey";

/// Diesel-backed implementation of the `BeanRepository` port.
#[derive(Clone)]
pub struct DieselBeanRepository {
    pool: DbPool,
}

impl DieselBeanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, BeanRepositoryError>>,
    ) -> Result<T, BeanRepositoryError> {
        with_query_timeout(
            self.pool.query_timeout(),
            operation,
            future,
            BeanRepositoryError::timeout,
        )
        .await
    }
}

fn map_pool_error(error: PoolError) -> BeanRepositoryError {
    BeanRepositoryError::connection(error.into_message())
}

/// Map Diesel errors from a write that set `roaster_id`.
///
/// A violation of `beans_roaster_id_fkey` becomes `InvalidReference`.
fn map_write_error(error: diesel::result::Error, roaster_id: i64) -> BeanRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::ForeignKey { constraint }
            if constraint.as_deref() == Some(ROASTER_FKEY) =>
        {
            BeanRepositoryError::invalid_reference(roaster_id)
        }
        other => map_failure(other),
    }
}

fn map_read_error(error: diesel::result::Error) -> BeanRepositoryError {
    map_failure(classify_diesel_error(error))
}

fn map_failure(failure: DieselFailure) -> BeanRepositoryError {
    match failure {
        DieselFailure::Connection(message) => BeanRepositoryError::connection(message),
        DieselFailure::ForeignKey { constraint } => {
            warn!(?constraint, "unrecognised foreign key violation on beans");
            BeanRepositoryError::query("foreign key violation")
        }
        DieselFailure::Unique { .. } => BeanRepositoryError::query("unique violation"),
        DieselFailure::Query(message) => BeanRepositoryError::query(message),
    }
}

fn rows_to_beans(rows: Vec<BeanRow>) -> Result<Vec<Bean>, BeanRepositoryError> {
    collect_rows(rows.into_iter().map(Bean::try_from), BeanRepositoryError::query)
}

type BoxedBeanQuery<'a> = beans::BoxedQuery<'a, diesel::pg::Pg>;

/// Apply the term filter and ordering for a bean search.
fn search_beans(query: &SearchQuery<BeanSortColumn>) -> BoxedBeanQuery<'static> {
    let mut statement = beans::table.into_boxed();
    for pattern in query.term_patterns() {
        statement = statement.filter(
            beans::name
                .concat(" ")
                .concat(beans::roast_level)
                .ilike(pattern),
        );
    }

    let sort = query.sort();
    statement = match (sort.column(), sort.direction()) {
        (BeanSortColumn::Id, SortDirection::Asc) => statement.order(beans::id.asc()),
        (BeanSortColumn::Id, SortDirection::Desc) => statement.order(beans::id.desc()),
        (BeanSortColumn::Name, SortDirection::Asc) => statement.order(beans::name.asc()),
        (BeanSortColumn::Name, SortDirection::Desc) => statement.order(beans::name.desc()),
        (BeanSortColumn::RoastLevel, SortDirection::Asc) => {
            statement.order(beans::roast_level.asc())
        }
        (BeanSortColumn::RoastLevel, SortDirection::Desc) => {
            statement.order(beans::roast_level.desc())
        }
    };
    statement.then_order_by(beans::id.asc())
}

async fn explain_missed_update(
    conn: &mut AsyncPgConnection,
    id: i64,
    expected_version: i32,
) -> BeanRepositoryError {
    let current = beans::table
        .find(id)
        .select(beans::version)
        .first::<i32>(conn)
        .await
        .optional();

    match current {
        Ok(Some(actual)) => BeanRepositoryError::edit_conflict(id, expected_version, actual),
        Ok(None) => BeanRepositoryError::not_found(id),
        Err(err) => map_read_error(err),
    }
}

#[async_trait]
impl BeanRepository for DieselBeanRepository {
    async fn list(
        &self,
        query: &SearchQuery<BeanSortColumn>,
    ) -> Result<Vec<Bean>, BeanRepositoryError> {
        self.timed("list beans", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<BeanRow> = search_beans(query)
                .select(BeanRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_read_error)?;
            rows_to_beans(rows)
        })
        .await
    }

    async fn list_by_roaster(&self, roaster_id: i64) -> Result<Vec<Bean>, BeanRepositoryError> {
        self.timed("list beans by roaster", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<BeanRow> = beans::table
                .filter(beans::roaster_id.eq(roaster_id))
                .select(BeanRow::as_select())
                .order_by(beans::id.asc())
                .load(&mut conn)
                .await
                .map_err(map_read_error)?;
            rows_to_beans(rows)
        })
        .await
    }

    async fn find(&self, id: i64) -> Result<Option<Bean>, BeanRepositoryError> {
        self.timed("find bean", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<BeanRow> = beans::table
                .find(id)
                .select(BeanRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_read_error)?;
            row.map(Bean::try_from)
                .transpose()
                .map_err(BeanRepositoryError::query)
        })
        .await
    }

    async fn insert(&self, draft: &BeanDraft) -> Result<Bean, BeanRepositoryError> {
        self.timed("insert bean", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: BeanRow = diesel::insert_into(beans::table)
                .values(BeanFields::from(draft))
                .returning(BeanRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(|err| map_write_error(err, draft.roaster_id))?;
            Bean::try_from(row).map_err(BeanRepositoryError::query)
        })
        .await
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &BeanDraft,
    ) -> Result<Bean, BeanRepositoryError> {
        self.timed("update bean", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let updated: Option<BeanRow> = diesel::update(
                beans::table
                    .filter(beans::id.eq(id))
                    .filter(beans::version.eq(expected_version)),
            )
            .set((
                BeanFields::from(draft),
                beans::version.eq(beans::version + 1),
            ))
            .returning(BeanRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, draft.roaster_id))?;

            match updated {
                Some(row) => Bean::try_from(row).map_err(BeanRepositoryError::query),
                None => Err(explain_missed_update(&mut conn, id, expected_version).await),
            }
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), BeanRepositoryError> {
        self.timed("delete bean", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let deleted = diesel::delete(beans::table.find(id))
                .execute(&mut conn)
                .await
                .map_err(map_read_error)?;
            if deleted == 0 {
                return Err(BeanRepositoryError::not_found(id));
            }
            Ok(())
        })
        .await
    }
}
