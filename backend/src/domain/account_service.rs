//! Account use-cases: signup, credential checks and permission lookups.
//!
//! Password hashing is CPU-bound, so it runs on the blocking pool rather than
//! on a request worker.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::domain::password::{hash_password, verify_password};
use crate::domain::ports::{
    PermissionRepository, PermissionRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    DEFAULT_PERMISSIONS, Error, FormError, LoginForm, NewUser, PermissionCode, Permissions,
    SignupForm, User, Validator, WRITER_PERMISSIONS,
};

/// Message shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Email or password is incorrect";
/// Field message for an e-mail address that is already registered.
pub const DUPLICATE_EMAIL: &str = "a user with this email address already exists";

/// Why a login attempt did not produce a user.
///
/// `UnknownEmail` and `WrongPassword` are kept apart for logging only; both
/// collapse to [`INVALID_CREDENTIALS`] via [`LoginError::into_form_error`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginError {
    Invalid(Validator),
    UnknownEmail,
    WrongPassword,
    Failed(Error),
}

impl LoginError {
    /// Short label for the `reason` log field.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_form",
            Self::UnknownEmail => "unknown_email",
            Self::WrongPassword => "wrong_password",
            Self::Failed(_) => "failed",
        }
    }

    /// The error as presented on the login form.
    pub fn into_form_error(self) -> FormError {
        match self {
            Self::Invalid(v) => FormError::Invalid(v),
            Self::UnknownEmail | Self::WrongPassword => {
                let mut v = Validator::new();
                v.add_non_field_error(INVALID_CREDENTIALS);
                FormError::Invalid(v)
            }
            Self::Failed(error) => FormError::Failed(error),
        }
    }
}

impl From<Error> for LoginError {
    fn from(value: Error) -> Self {
        Self::Failed(value)
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Timeout { operation } => {
            Error::internal(format!("user repository timed out during {operation}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::unprocessable(format!("email {email} is already registered"))
        }
    }
}

fn map_permission_error(error: PermissionRepositoryError) -> Error {
    match error {
        PermissionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("permission repository unavailable: {message}"))
        }
        PermissionRepositoryError::Query { message } => {
            Error::internal(format!("permission repository error: {message}"))
        }
        PermissionRepositoryError::Timeout { operation } => {
            Error::internal(format!("permission repository timed out during {operation}"))
        }
    }
}

/// Account service backed by the user and permission ports.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
    signup_permissions: Vec<PermissionCode>,
    writers: Vec<String>,
}

fn codes(raw: &[&str]) -> Vec<PermissionCode> {
    raw.iter()
        .filter_map(|code| PermissionCode::new(*code).ok())
        .collect()
}

impl AccountService {
    /// Service granting [`DEFAULT_PERMISSIONS`] to new accounts.
    pub fn new(users: Arc<dyn UserRepository>, permissions: Arc<dyn PermissionRepository>) -> Self {
        Self {
            users,
            permissions,
            signup_permissions: codes(&DEFAULT_PERMISSIONS),
            writers: Vec::new(),
        }
    }

    /// Replace the codes granted at signup.
    #[must_use]
    pub fn with_signup_permissions(mut self, codes: Vec<PermissionCode>) -> Self {
        self.signup_permissions = codes;
        self
    }

    /// Accounts signing up with one of `emails` also receive
    /// [`WRITER_PERMISSIONS`]. Addresses match case-insensitively.
    #[must_use]
    pub fn with_writers(mut self, emails: impl IntoIterator<Item = String>) -> Self {
        self.writers = emails
            .into_iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        self
    }

    fn grants_for(&self, email: &str) -> Vec<PermissionCode> {
        let mut grants = self.signup_permissions.clone();
        let email = email.to_lowercase();
        if self.writers.iter().any(|writer| *writer == email) {
            for code in codes(&WRITER_PERMISSIONS) {
                if !grants.contains(&code) {
                    grants.push(code);
                }
            }
        }
        grants
    }

    /// Register an activated account with the signup permissions.
    pub async fn signup(&self, form: &SignupForm) -> Result<User, FormError> {
        let draft = form.validate()?;
        let password = Zeroizing::new(draft.password().to_owned());
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| Error::internal(err.to_string()))?;

        let new_user = NewUser {
            name: draft.name,
            email: draft.email,
            password_hash,
            activated: true,
        };
        let grants = self.grants_for(&new_user.email);
        let user = self
            .users
            .insert_with_permissions(&new_user, &grants)
            .await
            .map_err(|err| match err {
                UserRepositoryError::DuplicateEmail { .. } => {
                    FormError::field("email", DUPLICATE_EMAIL)
                }
                other => FormError::Failed(map_user_error(other)),
            })?;
        tracing::info!(user_id = user.id, "user signed up");
        Ok(user)
    }

    /// Check login credentials and return the matching user.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<User, LoginError> {
        let credentials = form.validate().map_err(LoginError::Invalid)?;
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or(LoginError::UnknownEmail)?;

        let password = Zeroizing::new(credentials.password().to_owned());
        let stored = user.password_hash().to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|err| Error::internal(format!("password check task failed: {err}")))?
            .map_err(|err| Error::internal(err.to_string()))?;

        if matches {
            Ok(user)
        } else {
            Err(LoginError::WrongPassword)
        }
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }

    /// Invalidate every session issued to `user_id` so far.
    pub async fn end_sessions(&self, user_id: i64) -> Result<(), Error> {
        let epoch = self
            .users
            .advance_session_epoch(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        tracing::debug!(user_id, epoch, "session epoch advanced");
        Ok(())
    }

    /// Current permissions of `user_id`, read fresh from storage.
    pub async fn permissions(&self, user_id: i64) -> Result<Permissions, Error> {
        self.permissions
            .for_user(user_id)
            .await
            .map_err(map_permission_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
