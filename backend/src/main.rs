//! Roastery entry-point: loads settings, prepares storage and serves pages.

mod server;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use actix_web::web;

use roastery::inbound::http::health::HealthState;
use roastery::inbound::http::session_config::{BuildMode, session_settings_from_env};
use roastery::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use roastery::settings::AppSettings;

use server::{ServerConfig, create_server};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

/// Apply pending migrations, then open the pool.
async fn connect(settings: &AppSettings, database_url: &str) -> Result<DbPool> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .wrap_err("migration task failed")?
        .wrap_err("failed to apply migrations")?;
    info!(applied, "database migrations complete");

    let config = PoolConfig::new(database_url)
        .with_max_size(settings.db_max_connections()?)
        .with_idle_timeout(Some(settings.db_idle_timeout()?))
        .with_query_timeout(settings.query_timeout()?);
    DbPool::new(config)
        .await
        .wrap_err("failed to build database pool")
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings =
        AppSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(session, bind_addr)
        .with_writer_emails(settings.writer_emails())
        .with_request_timeout(settings.request_timeout()?)
        .with_shutdown_timeout(settings.shutdown_grace());
    if let Some(database_url) = settings.database_url() {
        config = config.with_db_pool(connect(&settings, database_url).await?);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "listening");

    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated with an error")
}
