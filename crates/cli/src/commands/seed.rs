//! Seed data.

use tracing::info;

use moonstone_db::CrystalRepository;
use moonstone_db::fixtures::CRYSTALS;

use super::{CliError, connect};

/// Upsert every crystal fixture. Existing rows keep their stock level.
///
/// Returns the number of crystals written.
pub async fn crystals() -> Result<usize, CliError> {
    let pool = connect().await?;
    let repo = CrystalRepository::new(&pool);

    for fixture in CRYSTALS {
        let crystal = repo.upsert(&fixture.to_new_crystal()).await?;
        info!(slug = %crystal.slug, stock = crystal.stock_quantity, "Seeded crystal");
    }

    info!("Seeded {} crystals", CRYSTALS.len());
    Ok(CRYSTALS.len())
}
