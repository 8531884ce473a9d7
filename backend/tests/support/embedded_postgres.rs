//! Embedded PostgreSQL databases for integration tests.
//!
//! All suites in a process share one cluster. Each test gets its own
//! database cloned from a template that already carries the migrations, so
//! tests never see each other's rows and migrations run once per schema
//! change.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use roastery::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use uuid::Uuid;

const CLUSTER_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const TEMPLATE_PREFIX: &str = "roastery_template";
/// Fixed so a reused data directory keeps accepting the same credentials.
const STABLE_PASSWORD: &str = "roastery-test";

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A migrated database that is dropped when this value goes away.
pub struct TestDatabase {
    pub url: String,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    /// A small pool over this database.
    pub async fn pool(&self) -> Result<DbPool, String> {
        DbPool::new(
            PoolConfig::new(self.url.as_str())
                .with_max_size(2)
                .with_query_timeout(Duration::from_secs(5)),
        )
        .await
        .map_err(|err| err.to_string())
    }
}

fn cluster() -> Result<&'static ClusterHandle, String> {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library starts any threads.
        unsafe { std::env::set_var("PG_PASSWORD", STABLE_PASSWORD) };
    }
    let mut attempt = 1;
    loop {
        match shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt < CLUSTER_RETRIES => {
                eprintln!("embedded cluster attempt {attempt}/{CLUSTER_RETRIES} failed: {err:?}");
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(err) => return Err(format!("{err:?}")),
        }
    }
}

fn template_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    Ok(format!("{TEMPLATE_PREFIX}_{}", hash.get(..8).unwrap_or(&hash)))
}

fn ensure_template(cluster: &ClusterHandle) -> Result<String, String> {
    let name = template_name()?;
    let _guard = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|err| format!("template lookup: {err:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        run_pending_migrations(&cluster.connection().database_url(&name))
            .map_err(|err| format!("migrate template: {err}"))?;
    }
    Ok(name)
}

fn provision() -> Result<TestDatabase, String> {
    let cluster = cluster()?;
    let template = ensure_template(cluster)?;
    let name = format!("test_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database_from_template(name.as_str(), template.as_str())
        .map_err(|err| format!("clone template: {err:?}"))?;
    Ok(TestDatabase {
        url: database.url().to_owned(),
        _database: database,
    })
}

/// A fresh migrated database, or `None` when the cluster is unavailable and
/// `SKIP_TEST_CLUSTER` is set.
pub fn test_database() -> Option<TestDatabase> {
    provision()
        .map(Some)
        .unwrap_or_else(|reason| super::handle_cluster_setup_failure(reason))
}
