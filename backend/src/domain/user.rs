//! User accounts and the request-scoped identity.

use std::fmt;

use chrono::{DateTime, Utc};

/// A registered account.
///
/// The password hash is never rendered; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    password_hash: String,
    pub activated: bool,
    pub created_at: DateTime<Utc>,
    pub version: i32,
    /// Incremented on logout. A session is valid only while it carries the
    /// current value.
    pub session_epoch: i32,
}

impl User {
    /// Assemble a user from stored fields.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        activated: bool,
        created_at: DateTime<Utc>,
        version: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            activated,
            created_at,
            version,
            session_epoch: 0,
        }
    }

    #[must_use]
    pub fn with_session_epoch(mut self, session_epoch: i32) -> Self {
        self.session_epoch = session_epoch;
        self
    }

    /// PHC-format password hash.
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("activated", &self.activated)
            .field("created_at", &self.created_at)
            .field("version", &self.version)
            .field("session_epoch", &self.session_epoch)
            .finish()
    }
}

/// Account fields ready for insertion; the password is already hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("activated", &self.activated)
            .finish_non_exhaustive()
    }
}

/// Identity attached to the current request.
///
/// Requests without a valid session resolve to [`CurrentUser::Anonymous`];
/// there is no "missing user" state to check separately.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentUser {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl CurrentUser {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    /// `true` only for an authenticated, activated account.
    pub fn is_activated(&self) -> bool {
        self.user().is_some_and(|user| user.activated)
    }
}
