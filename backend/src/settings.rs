//! Application settings loaded via OrthoConfig.
//!
//! Every value can come from a `ROASTERY_*` environment variable, a config
//! file, or the command line. Session cookie settings are read separately;
//! see [`crate::inbound::http::session_config`].

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 900;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Raised when a setting holds an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Server and database settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROASTERY")]
pub struct AppSettings {
    /// Socket address to listen on, e.g. `127.0.0.1:4000`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps data in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub db_max_connections: Option<u32>,
    /// Seconds before an idle pooled connection is closed.
    pub db_idle_timeout_secs: Option<u64>,
    /// Deadline in seconds for each database operation.
    pub query_timeout_secs: Option<u64>,
    /// Seconds a client has to send its request head.
    pub request_timeout_secs: Option<u64>,
    /// Seconds in-flight requests get to finish on shutdown.
    pub shutdown_grace_secs: Option<u64>,
    /// Comma-separated e-mail addresses granted write access at signup.
    pub writer_emails: Option<String>,
}

fn positive_secs(value: Option<u64>, default: u64, name: &'static str) -> Result<Duration, SettingsError> {
    match value.unwrap_or(default) {
        0 => Err(SettingsError::Zero { name }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

impl AppSettings {
    /// The listen address, defaulting to `0.0.0.0:4000`.
    ///
    /// # Errors
    /// Returns [`SettingsError::BindAddr`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// The database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// # Errors
    /// Returns [`SettingsError::Zero`] for a zero value.
    pub fn db_max_connections(&self) -> Result<u32, SettingsError> {
        match self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS) {
            0 => Err(SettingsError::Zero {
                name: "db_max_connections",
            }),
            size => Ok(size),
        }
    }

    /// # Errors
    /// Returns [`SettingsError::Zero`] for a zero value.
    pub fn db_idle_timeout(&self) -> Result<Duration, SettingsError> {
        positive_secs(
            self.db_idle_timeout_secs,
            DEFAULT_DB_IDLE_TIMEOUT_SECS,
            "db_idle_timeout_secs",
        )
    }

    /// # Errors
    /// Returns [`SettingsError::Zero`] for a zero value.
    pub fn query_timeout(&self) -> Result<Duration, SettingsError> {
        positive_secs(
            self.query_timeout_secs,
            DEFAULT_QUERY_TIMEOUT_SECS,
            "query_timeout_secs",
        )
    }

    /// # Errors
    /// Returns [`SettingsError::Zero`] for a zero value.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        positive_secs(
            self.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
            "request_timeout_secs",
        )
    }

    /// Addresses from `writer_emails`, trimmed, with blanks dropped.
    pub fn writer_emails(&self) -> Vec<String> {
        self.writer_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Zero is allowed and means "stop immediately".
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_grace_secs
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "ROASTERY_BIND_ADDR",
        "ROASTERY_DATABASE_URL",
        "ROASTERY_DB_MAX_CONNECTIONS",
        "ROASTERY_DB_IDLE_TIMEOUT_SECS",
        "ROASTERY_QUERY_TIMEOUT_SECS",
        "ROASTERY_REQUEST_TIMEOUT_SECS",
        "ROASTERY_SHUTDOWN_GRACE_SECS",
        "ROASTERY_WRITER_EMAILS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("roastery")]).expect("config should load")
    }

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.db_max_connections(), Ok(25));
        assert_eq!(settings.query_timeout(), Ok(Duration::from_secs(3)));
        assert_eq!(settings.request_timeout(), Ok(Duration::from_secs(5)));
        assert_eq!(settings.shutdown_grace(), Duration::from_secs(30));
        assert!(settings.writer_emails().is_empty());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("ROASTERY_BIND_ADDR", "127.0.0.1:4000"),
            ("ROASTERY_DATABASE_URL", "postgres://localhost/roastery"),
            ("ROASTERY_DB_MAX_CONNECTIONS", "5"),
            ("ROASTERY_QUERY_TIMEOUT_SECS", "10"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address"),
            "127.0.0.1:4000".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.database_url(), Some("postgres://localhost/roastery"));
        assert_eq!(settings.db_max_connections(), Ok(5));
        assert_eq!(settings.query_timeout(), Ok(Duration::from_secs(10)));
    }

    #[rstest]
    fn blank_database_url_means_memory() {
        let _guard = lock_env(env_with(&[("ROASTERY_DATABASE_URL", "  ")]));
        assert_eq!(load_from_empty_args().database_url(), None);
    }

    #[rstest]
    fn bad_values_are_reported() {
        let _guard = lock_env(env_with(&[
            ("ROASTERY_BIND_ADDR", "localhost"),
            ("ROASTERY_QUERY_TIMEOUT_SECS", "0"),
        ]));

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::BindAddr { .. })
        ));
        assert_eq!(
            settings.query_timeout(),
            Err(SettingsError::Zero {
                name: "query_timeout_secs"
            })
        );
    }

    #[rstest]
    fn writer_emails_split_on_commas() {
        let _guard = lock_env(env_with(&[(
            "ROASTERY_WRITER_EMAILS",
            " ada@example.com, ,grace@example.com ",
        )]));

        assert_eq!(
            load_from_empty_args().writer_emails(),
            ["ada@example.com", "grace@example.com"]
        );
    }
}
