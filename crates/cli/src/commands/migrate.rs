//! Database migrations.
//!
//! Migrations live in `crates/db/migrations/` and are embedded at build time.

use super::{CliError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../db/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
