//! `SKIP_TEST_CLUSTER` policy for suites that need embedded PostgreSQL.
//!
//! Where the cluster cannot start (no network to fetch binaries, sandboxed
//! filesystem), setting `SKIP_TEST_CLUSTER=1` turns setup failures into
//! skips. Without it a failure panics so CI never silently passes.

/// `true` for `1`, `true` or `yes`, ignoring case.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .is_ok_and(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Skip (returning `None`) or panic, depending on `SKIP_TEST_CLUSTER`.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    assert!(
        should_skip_test_cluster(),
        "embedded PostgreSQL setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip."
    );
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
