//! Signup and login forms.
//!
//! Forms arrive as raw strings. `validate` turns them into drafts or
//! credentials whose password lives in [`Zeroizing`] storage.

use std::fmt;

use serde::Deserialize;
use zeroize::Zeroizing;

use super::validator::{self, Validator};

pub const USER_NAME_MAX: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 30;
/// Upper bound on password bytes accepted by the hashing layer.
pub const PASSWORD_MAX_BYTES: usize = 72;

fn check_password(v: &mut Validator, password: &str) {
    v.check_field(
        validator::not_blank(password),
        "password",
        "this field cannot be blank",
    );
    v.check_field(
        validator::min_chars(password, PASSWORD_MIN_CHARS),
        "password",
        "this field must be at least 8 characters",
    );
    v.check_field(
        validator::max_chars(password, PASSWORD_MAX_CHARS),
        "password",
        "this field must be at most 30 characters",
    );
    v.check_field(
        validator::max_bytes(password, PASSWORD_MAX_BYTES),
        "password",
        "this field must be at most 72 bytes",
    );
}

fn check_email(v: &mut Validator, email: &str) {
    v.check_field(validator::not_blank(email), "email", "this field cannot be blank");
    v.check_field(
        validator::is_email(email),
        "email",
        "this field must be a valid email address",
    );
}

/// Raw signup form.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Validated signup details with the plaintext password still to be hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct SignupDraft {
    pub name: String,
    pub email: String,
    password: Zeroizing<String>,
}

impl fmt::Debug for SignupDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDraft")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignupDraft {
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl SignupForm {
    /// Check every field and return a draft or the collected errors.
    ///
    /// # Examples
    /// ```
    /// use roastery::domain::SignupForm;
    ///
    /// let form = SignupForm {
    ///     name: "Ada".into(),
    ///     email: "ada@example.com".into(),
    ///     password: "correct horse".into(),
    /// };
    /// assert_eq!(form.validate().unwrap().email, "ada@example.com");
    /// ```
    pub fn validate(&self) -> Result<SignupDraft, Validator> {
        let mut v = Validator::new();
        let name = self.name.trim();
        let email = self.email.trim();

        v.check_field(validator::not_blank(name), "name", "this field cannot be blank");
        v.check_field(
            validator::max_chars(name, USER_NAME_MAX),
            "name",
            "this field must be at most 20 characters",
        );
        check_email(&mut v, email);
        check_password(&mut v, &self.password);

        if !v.is_valid() {
            return Err(v);
        }
        Ok(SignupDraft {
            name: name.to_owned(),
            email: email.to_owned(),
            password: Zeroizing::new(self.password.clone()),
        })
    }
}

/// Raw login form.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Validated login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginCredentials {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl LoginForm {
    /// Check the form shape; credential correctness is decided later.
    pub fn validate(&self) -> Result<LoginCredentials, Validator> {
        let mut v = Validator::new();
        let email = self.email.trim();
        check_email(&mut v, email);
        check_password(&mut v, &self.password);

        if !v.is_valid() {
            return Err(v);
        }
        Ok(LoginCredentials {
            email: email.to_owned(),
            password: Zeroizing::new(self.password.clone()),
        })
    }
}
