//! Permission codes and per-user permission sets.

use std::fmt;

/// Read access to roasters.
pub const ROASTERS_READ: &str = "roasters:read";
/// Create, edit and delete roasters.
pub const ROASTERS_WRITE: &str = "roasters:write";
/// Read access to beans.
pub const BEANS_READ: &str = "beans:read";
/// Create, edit and delete beans.
pub const BEANS_WRITE: &str = "beans:write";

/// Codes granted to every new account.
pub const DEFAULT_PERMISSIONS: [&str; 2] = [ROASTERS_READ, BEANS_READ];
/// Codes added at signup for configured writer accounts.
pub const WRITER_PERMISSIONS: [&str; 2] = [ROASTERS_WRITE, BEANS_WRITE];

/// Validation errors for [`PermissionCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionCodeError {
    #[error("permission code must have the form resource:action, got '{0}'")]
    Malformed(String),
}

/// A `resource:action` permission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Validate and wrap a permission code.
    ///
    /// # Examples
    /// ```
    /// use roastery::domain::PermissionCode;
    ///
    /// assert!(PermissionCode::new("beans:write").is_ok());
    /// assert!(PermissionCode::new("beans").is_err());
    /// ```
    pub fn new(code: impl Into<String>) -> Result<Self, PermissionCodeError> {
        let code = code.into();
        let well_formed = code.split_once(':').is_some_and(|(resource, action)| {
            !resource.is_empty()
                && !action.is_empty()
                && !action.contains(':')
                && !code.chars().any(char::is_whitespace)
        });
        if well_formed {
            Ok(Self(code))
        } else {
            Err(PermissionCodeError::Malformed(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The permission codes held by one user at the time they were loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(Vec<PermissionCode>);

impl Permissions {
    pub fn new(codes: Vec<PermissionCode>) -> Self {
        Self(codes)
    }

    /// Exact-match membership test.
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|held| held.as_str() == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PermissionCode> for Permissions {
    fn from_iter<I: IntoIterator<Item = PermissionCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
