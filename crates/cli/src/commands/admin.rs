//! Admin user management.
//!
//! Admins are ordinary accounts with the `admin` role, so an existing
//! customer account can be promoted.

use moonstone_core::password::{hash_password, validate_password};
use moonstone_core::{Email, UserId, UserRole};
use moonstone_db::UserRepository;

use super::{CliError, connect};

/// Create an admin user, or promote and re-password an existing account.
///
/// Returns the user's ID.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, CliError> {
    let email = Email::parse(email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = if let Some(existing) = users.get_by_email(&email).await? {
        tracing::info!("Promoting existing account {} to admin", email);
        users.set_password(existing.id, &password_hash).await?;
        if existing.name.is_none() {
            users.update_name(existing.id, name).await?;
        }
        users.set_role(existing.id, UserRole::Admin).await?
    } else {
        users
            .create_with_password(&email, Some(name), &password_hash, UserRole::Admin)
            .await?
    };

    tracing::info!(
        "Admin user ready. ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}
