//! Command implementations.

pub mod admin;
pub mod blog;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use moonstone_core::password::PasswordError;
use moonstone_db::RepositoryError;

/// Errors from any command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] moonstone_core::EmailError),

    /// Password rejected or could not be hashed.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// No topic with that number.
    #[error("No topic number {number}; choose 1 to {count}")]
    UnknownTopic { number: usize, count: usize },
}

/// Connect using `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(moonstone_db::create_pool(&database_url).await?)
}
