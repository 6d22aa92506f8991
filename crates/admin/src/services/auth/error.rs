//! Admin authentication error types.

use thiserror::Error;

use moonstone_core::password::PasswordError;
use moonstone_db::RepositoryError;

/// Errors that can occur during admin sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] moonstone_core::EmailError),

    /// Wrong password, unknown email, or no password set.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but is not an admin.
    #[error("this account cannot access the admin")]
    NotAdmin,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PasswordError> for AuthError {
    fn from(_: PasswordError) -> Self {
        Self::InvalidCredentials
    }
}
