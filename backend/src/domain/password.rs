//! Argon2id password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Failures raised by the hashing layer itself, never by a wrong password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// Compare `password` with a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; errors only when `hash` cannot be used.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|err| PasswordError::MalformedHash(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::Hash(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hashes_verify_against_their_password() {
        let hash = hash_password("pa55word!").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(verify_password("pa55word!", &hash), Ok(true));
        assert_eq!(verify_password("pa55word?", &hash), Ok(false));
    }

    #[rstest]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("pa55word!").expect("hash");
        let second = hash_password("pa55word!").expect("hash");
        assert_ne!(first, second);
    }

    #[rstest]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("pa55word!", "not-a-hash"),
            Err(PasswordError::MalformedHash(_))
        ));
    }
}
