//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use roastery::inbound::http::session_config::SessionSettings;
use roastery::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) writer_emails: Vec<String>,
    pub(crate) request_timeout: Duration,
    pub(crate) shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Construct a server configuration from resolved session settings.
    ///
    /// Requests must arrive within 5 seconds and shutdown waits up to 30
    /// seconds for in-flight requests unless overridden.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            writer_emails: Vec::new(),
            request_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    /// Attach a database connection pool.
    ///
    /// Without one the server keeps everything in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Accounts that receive write permissions when they sign up.
    #[must_use]
    pub fn with_writer_emails(mut self, emails: Vec<String>) -> Self {
        self.writer_emails = emails;
        self
    }

    /// Deadline for a client to send its request head.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Grace period for in-flight requests on shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
