//! PostgreSQL-backed `RoasterRepository` implementation using Diesel ORM.
//!
//! Updates are a compare-and-swap on `version` executed in SQL. When the swap
//! matches no row, the row is read again to tell a stale version from a
//! missing roaster.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{RoasterRepository, RoasterRepositoryError};
use crate::domain::{Roaster, RoasterDraft, RoasterSortColumn, SearchQuery, SortDirection};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, with_query_timeout};
use super::models::{RoasterFields, RoasterRow};
use super::pool::{DbPool, PoolError};
use super::schema::roasters;

/// Diesel-backed implementation of the `RoasterRepository` port.
#[derive(Clone)]
pub struct DieselRoasterRepository {
    pool: DbPool,
}

impl DieselRoasterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, RoasterRepositoryError>>,
    ) -> Result<T, RoasterRepositoryError> {
        with_query_timeout(
            self.pool.query_timeout(),
            operation,
            future,
            RoasterRepositoryError::timeout,
        )
        .await
    }
}

fn map_pool_error(error: PoolError) -> RoasterRepositoryError {
    RoasterRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> RoasterRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => RoasterRepositoryError::connection(message),
        DieselFailure::ForeignKey { .. } => RoasterRepositoryError::query("foreign key violation"),
        DieselFailure::Unique { .. } => RoasterRepositoryError::query("unique violation"),
        DieselFailure::Query(message) => RoasterRepositoryError::query(message),
    }
}

type BoxedRoasterQuery<'a> = roasters::BoxedQuery<'a, diesel::pg::Pg>;

/// Apply the term filter and ordering for a roaster search.
fn search_roasters(query: &SearchQuery<RoasterSortColumn>) -> BoxedRoasterQuery<'static> {
    let mut statement = roasters::table.into_boxed();
    for pattern in query.term_patterns() {
        statement = statement.filter(
            roasters::name
                .concat(" ")
                .concat(roasters::description)
                .concat(" ")
                .concat(roasters::location)
                .ilike(pattern),
        );
    }

    let sort = query.sort();
    statement = match (sort.column(), sort.direction()) {
        (RoasterSortColumn::Id, SortDirection::Asc) => statement.order(roasters::id.asc()),
        (RoasterSortColumn::Id, SortDirection::Desc) => statement.order(roasters::id.desc()),
        (RoasterSortColumn::Name, SortDirection::Asc) => statement.order(roasters::name.asc()),
        (RoasterSortColumn::Name, SortDirection::Desc) => statement.order(roasters::name.desc()),
        (RoasterSortColumn::Location, SortDirection::Asc) => {
            statement.order(roasters::location.asc())
        }
        (RoasterSortColumn::Location, SortDirection::Desc) => {
            statement.order(roasters::location.desc())
        }
    };
    statement.then_order_by(roasters::id.asc())
}

/// Decide why a version-checked update touched no row.
async fn explain_missed_update(
    conn: &mut AsyncPgConnection,
    id: i64,
    expected_version: i32,
) -> RoasterRepositoryError {
    let current = roasters::table
        .find(id)
        .select(roasters::version)
        .first::<i32>(conn)
        .await
        .optional();

    match current {
        Ok(Some(actual)) => RoasterRepositoryError::edit_conflict(id, expected_version, actual),
        Ok(None) => RoasterRepositoryError::not_found(id),
        Err(err) => map_diesel_error(err),
    }
}

#[async_trait]
impl RoasterRepository for DieselRoasterRepository {
    async fn list(
        &self,
        query: &SearchQuery<RoasterSortColumn>,
    ) -> Result<Vec<Roaster>, RoasterRepositoryError> {
        self.timed("list roasters", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<RoasterRow> = search_roasters(query)
                .select(RoasterRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Roaster::from).collect())
        })
        .await
    }

    async fn find(&self, id: i64) -> Result<Option<Roaster>, RoasterRepositoryError> {
        self.timed("find roaster", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<RoasterRow> = roasters::table
                .find(id)
                .select(RoasterRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(Roaster::from))
        })
        .await
    }

    async fn insert(&self, draft: &RoasterDraft) -> Result<Roaster, RoasterRepositoryError> {
        self.timed("insert roaster", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: RoasterRow = diesel::insert_into(roasters::table)
                .values(RoasterFields::from(draft))
                .returning(RoasterRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(Roaster::from(row))
        })
        .await
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &RoasterDraft,
    ) -> Result<Roaster, RoasterRepositoryError> {
        self.timed("update roaster", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let updated: Option<RoasterRow> = diesel::update(
                roasters::table
                    .filter(roasters::id.eq(id))
                    .filter(roasters::version.eq(expected_version)),
            )
            .set((
                RoasterFields::from(draft),
                roasters::version.eq(roasters::version + 1),
            ))
            .returning(RoasterRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

            match updated {
                Some(row) => Ok(Roaster::from(row)),
                None => Err(explain_missed_update(&mut conn, id, expected_version).await),
            }
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), RoasterRepositoryError> {
        self.timed("delete roaster", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let deleted = diesel::delete(roasters::table.find(id))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RoasterRepositoryError::not_found(id));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use diesel::pg::Pg;
    use rstest::rstest;

    fn sql_for(query: &SearchQuery<RoasterSortColumn>) -> String {
        let statement = search_roasters(query).select(RoasterRow::as_select());
        debug_query::<Pg, _>(&statement).to_string()
    }

    #[rstest]
    fn empty_term_adds_no_filter() {
        let sql = sql_for(&SearchQuery::default());
        assert!(!sql.contains("ILIKE"));
        assert!(sql.contains(r#"ORDER BY "roasters"."id" ASC, "roasters"."id" ASC"#));
    }

    #[rstest]
    fn every_word_becomes_an_ilike_filter() {
        let query = SearchQuery::new(
            "dark roast",
            crate::domain::SortDirective::new(RoasterSortColumn::Name, SortDirection::Desc),
        );
        let sql = sql_for(&query);
        assert_eq!(sql.matches("ILIKE").count(), 2);
        assert!(sql.contains(r#""roasters"."name" DESC, "roasters"."id" ASC"#));
        assert!(sql.contains("%dark%"));
        assert!(sql.contains("%roast%"));
    }
}
