//! Shared helpers for the integration suites.
//!
//! Each file under `tests/` compiles as its own crate and pulls these in with
//! `mod support;`; not every suite uses every helper.
#![allow(dead_code, reason = "each integration crate uses a different subset")]

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{TestDatabase, test_database};

/// Render a `postgres` error with its SQLSTATE, message and detail.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!("{:?}: {}", db_error.code(), db_error.message());
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}
