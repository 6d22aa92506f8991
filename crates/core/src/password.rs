//! Argon2id password hashing shared by the storefront, admin and CLI.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from password handling.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password does not meet requirements.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Required minimum length.
        min: usize,
    },
    /// The password did not match the stored hash (or the hash is unreadable).
    #[error("invalid credentials")]
    Mismatch,
    /// Hashing failed.
    #[error("password hashing error")]
    Hash,
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns [`PasswordError::TooShort`] for passwords under
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a PHC-format hash.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] if the password is wrong or the stored
/// hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("selenite-dreams").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("selenite-dreams", &hash).is_ok());
        assert_eq!(
            verify_password("wrong-password", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert_eq!(
            verify_password("anything", "not-a-hash"),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
