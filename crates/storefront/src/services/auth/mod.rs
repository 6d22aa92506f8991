//! Authentication service.
//!
//! Email and password accounts. Guests who checked out before registering
//! already have a `user` row (created by the payment webhook); registering
//! with that email attaches a password to the existing account.

mod error;

pub use error::AuthError;

use sqlx::PgPool;
use tracing::instrument;

use moonstone_core::password::{hash_password, validate_password, verify_password};
use moonstone_core::{Email, UserRole};
use moonstone_db::models::User;
use moonstone_db::{RepositoryError, UserRepository};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email already has a password.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        name: Option<&str>,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        // Guest checkout rows have no password yet; claim them.
        if let Some(existing) = self.users.get_by_email(&email).await? {
            if self.users.get_password_hash(&email).await?.is_some() {
                return Err(AuthError::UserAlreadyExists);
            }
            self.users.set_password(existing.id, &password_hash).await?;
            let user = match name {
                Some(name) if existing.name.is_none() => {
                    self.users.update_name(existing.id, name).await?
                }
                _ => existing,
            };
            tracing::info!(user_id = %user.id, "Guest account claimed");
            return Ok(user);
        }

        let user = self
            .users
            .create_with_password(&email, name, &password_hash, UserRole::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonstone_core::password::PasswordError;

    #[test]
    fn test_password_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(PasswordError::TooShort { min: 8 }),
            AuthError::WeakPassword(msg) if msg.contains('8')
        ));
        assert!(matches!(
            AuthError::from(PasswordError::Mismatch),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(PasswordError::Hash),
            AuthError::PasswordHash
        ));
    }
}
