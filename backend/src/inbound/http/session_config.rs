//! Cookie session settings read from `SESSION_*` environment variables.
//!
//! These stay out of [`crate::settings::AppSettings`] so key material never
//! passes through the layered loader. Debug builds warn and fall back to a
//! default on bad input; release builds refuse to start.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
/// Minimum accepted length of the session key file in bytes.
pub const SESSION_KEY_MIN_LEN: usize = 64;
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// How strictly session variables are validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// The mode this binary was compiled in.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Cookie session parameters handed to the server.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the session key file failed and no temporary key is allowed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file is shorter than [`SESSION_KEY_MIN_LEN`].
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires a secure cookie in release builds.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
}

/// Build session settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use roastery::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_file = tempfile::NamedTempFile::new()?;
/// std::fs::write(key_file.path(), vec![b'a'; 64])?;
/// let key_path = key_file.path().to_string_lossy().into_owned();
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "SESSION_KEY_FILE" => Some(key_path.clone()),
///     "SESSION_SAMESITE" => Some("Strict".to_owned()),
///     _ => None,
/// });
///
/// let settings = session_settings_from_env(&env, BuildMode::Release)?;
/// assert!(settings.cookie_secure);
/// # Ok(())
/// # }
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = SessionEnv { env, mode };
    let cookie_secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(cookie_secure)?;
    let key = reader.key(reader.flag(ALLOW_EPHEMERAL_ENV, false)?)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Reads session variables, applying the leniency of the build mode.
struct SessionEnv<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> SessionEnv<'_, E> {
    /// Debug builds log `problem` and carry on with `fallback`.
    fn lenient<T>(&self, fallback: T, problem: SessionConfigError) -> Result<T, SessionConfigError> {
        if !self.mode.is_debug() {
            return Err(problem);
        }
        warn!(error = %problem, "session setting ignored; using default");
        Ok(fallback)
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, SessionConfigError> {
        let Some(raw) = self.env.string(name) else {
            return Ok(default);
        };
        match parse_bool(&raw) {
            Some(flag) => Ok(flag),
            None => self.lenient(
                default,
                SessionConfigError::InvalidEnv {
                    name,
                    value: raw,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let Some(raw) = self.env.string(SAMESITE_ENV) else {
            return Ok(SameSite::Lax);
        };
        let policy = match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "lax" => SameSite::Lax,
            "none" => SameSite::None,
            _ => {
                return self.lenient(
                    SameSite::Lax,
                    SessionConfigError::InvalidEnv {
                        name: SAMESITE_ENV,
                        value: raw,
                        expected: SAMESITE_EXPECTED,
                    },
                );
            }
        };
        // Browsers drop `SameSite=None` cookies that are not `Secure`.
        if policy == SameSite::None && !cookie_secure {
            return self.lenient(policy, SessionConfigError::InsecureSameSiteNone);
        }
        Ok(policy)
    }

    /// The key file is mandatory in release builds unless ephemeral keys are
    /// explicitly allowed. A short key is always an error.
    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = self
            .env
            .string(KEY_FILE_ENV)
            .map_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH), PathBuf::from);
        let mut bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if self.mode.is_debug() || allow_ephemeral => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "no session key file; generated key will not outlive this process"
                );
                return Ok(Key::generate());
            }
            Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
        };
        let length = bytes.len();
        let key = (length >= SESSION_KEY_MIN_LEN).then(|| Key::derive_from(&bytes));
        bytes.zeroize();
        key.ok_or(SessionConfigError::KeyTooShort {
            path,
            length,
            min_len: SESSION_KEY_MIN_LEN,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
