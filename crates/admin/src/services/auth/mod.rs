//! Admin authentication service.
//!
//! Admins are ordinary `user` rows with the `admin` role and a password
//! (created with `ms-cli admin create`). Customers with valid credentials
//! are refused.

mod error;

pub use error::AuthError;

use sqlx::PgPool;
use tracing::instrument;

use moonstone_core::Email;
use moonstone_core::password::verify_password;
use moonstone_db::UserRepository;
use moonstone_db::models::User;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Verify credentials and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, and `AuthError::NotAdmin` when the password matches a
    /// customer account.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let (user, hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;
        ensure_admin(&user)?;

        tracing::info!(user_id = %user.id, "Admin signed in");
        Ok(user)
    }
}

/// Refuse anyone without the admin role.
fn ensure_admin(user: &User) -> Result<(), AuthError> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, "Non-admin attempted admin sign-in");
        Err(AuthError::NotAdmin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use moonstone_core::{UserId, UserRole};

    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("selene@moonstone.shop").unwrap(),
            name: Some("Selene".to_string()),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_admin() {
        assert!(ensure_admin(&user(UserRole::Admin)).is_ok());
        assert!(matches!(
            ensure_admin(&user(UserRole::Customer)),
            Err(AuthError::NotAdmin)
        ));
    }

    #[test]
    fn test_password_errors_hide_detail() {
        let err: AuthError = moonstone_core::password::PasswordError::Mismatch.into();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
