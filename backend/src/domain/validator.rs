//! Form validation accumulator.
//!
//! A [`Validator`] collects per-field messages and form-wide messages while a
//! draft is checked. Only the first message recorded for a field is kept, so
//! checks should be ordered from most to least fundamental.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::Error;

/// Messages collected while validating a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` against `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record a form-wide message.
    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Record `message` against `field` when `ok` is false.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    /// Message recorded for `field`, if any.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// All per-field messages keyed by field name.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Form-wide messages in insertion order.
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// Outcome of a failed form submission.
///
/// `Invalid` carries messages to render back into the form; `Failed` is any
/// other domain error and follows the normal error path.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    Invalid(Validator),
    Failed(Error),
}

impl FormError {
    /// A single field error, typically raised after storage rejected a value.
    pub fn field(field: &str, message: &str) -> Self {
        let mut v = Validator::new();
        v.add_field_error(field, message);
        Self::Invalid(v)
    }
}

impl From<Error> for FormError {
    fn from(value: Error) -> Self {
        Self::Failed(value)
    }
}

impl From<Validator> for FormError {
    fn from(value: Validator) -> Self {
        Self::Invalid(value)
    }
}

/// `true` when `value` contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `true` when `value` has at most `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// `true` when `value` has at least `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// `true` when `value` encodes to at most `n` UTF-8 bytes.
pub fn max_bytes(value: &str, n: usize) -> bool {
    value.len() <= n
}

/// `true` when `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// `true` when `value` is an absolute `http` or `https` URL with a host.
pub fn is_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = concat!(
            "^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@",
            "[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        );
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// `true` when `value` looks like an e-mail address.
pub fn is_email(value: &str) -> bool {
    email_regex().is_match(value)
}
