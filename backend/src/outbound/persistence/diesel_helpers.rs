//! Shared helpers for Diesel repository implementations.
//!
//! Repositories classify Diesel failures through [`classify_diesel_error`] and
//! then build their own port error from the [`DieselFailure`]. Every operation
//! runs under [`with_query_timeout`].

use std::future::Future;
use std::time::Duration;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

/// Constraint enforcing unique account e-mail addresses.
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Storage-independent view of a Diesel error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieselFailure {
    /// The connection dropped or could not be used.
    Connection(String),
    /// A foreign key rejected the row.
    ForeignKey { constraint: Option<String> },
    /// A unique constraint rejected the row.
    Unique { constraint: Option<String> },
    /// Anything else.
    Query(String),
}

/// Classify a Diesel error and emit debug context.
pub fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::ForeignKeyViolation => DieselFailure::ForeignKey {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::UniqueViolation => DieselFailure::Unique {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::ClosedConnection => {
                DieselFailure::Connection("database connection error".to_owned())
            }
            _ => DieselFailure::Query("database error".to_owned()),
        },
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

/// Run `operation`, replacing it with `on_timeout()` once `limit` elapses.
pub async fn with_query_timeout<T, E, F>(
    limit: Duration,
    operation: &'static str,
    future: F,
    on_timeout: impl FnOnce(&'static str) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    if let Ok(result) = tokio::time::timeout(limit, future).await {
        result
    } else {
        warn!(operation, timeout_ms = limit.as_millis(), "database operation timed out");
        Err(on_timeout(operation))
    }
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    struct Info {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "violation"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { constraint }))
    }

    #[rstest]
    fn unique_violation_keeps_constraint_name() {
        let failure = classify_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some(USERS_EMAIL_KEY),
        ));
        assert_eq!(
            failure,
            DieselFailure::Unique {
                constraint: Some(USERS_EMAIL_KEY.to_owned())
            }
        );
    }

    #[rstest]
    fn foreign_key_violation_is_recognised() {
        let failure = classify_diesel_error(database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            Some("beans_roaster_id_fkey"),
        ));
        assert!(matches!(failure, DieselFailure::ForeignKey { .. }));
    }

    #[rstest]
    #[case(database_error(DatabaseErrorKind::ClosedConnection, None), true)]
    #[case(DieselError::NotFound, false)]
    #[case(database_error(DatabaseErrorKind::CheckViolation, None), false)]
    fn connection_failures_are_separated(#[case] error: DieselError, #[case] is_connection: bool) {
        assert_eq!(
            matches!(classify_diesel_error(error), DieselFailure::Connection(_)),
            is_connection
        );
    }

    #[tokio::test]
    async fn slow_operation_times_out() {
        let result: Result<(), String> = with_query_timeout(
            Duration::from_millis(10),
            "sleep",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            |operation| format!("timed out: {operation}"),
        )
        .await;
        assert_eq!(result, Err("timed out: sleep".to_owned()));
    }

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let result: Result<u8, String> =
            with_query_timeout(Duration::from_secs(1), "noop", async { Ok(7) }, |op| {
                op.to_owned()
            })
            .await;
        assert_eq!(result, Ok(7));
    }
}
