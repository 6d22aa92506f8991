//! Crystal repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{instrument, warn};

use moonstone_core::{CrystalId, Money, ZodiacSign};

use super::{RepositoryError, search_pattern};
use crate::models::{Crystal, CrystalUpdate, NewCrystal};

/// Stock level at or below which a crystal counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const CRYSTAL_COLUMNS: &str = r"
    id, name, slug, category, price, compare_at_price, description,
    meta_title, meta_description, image_url, chakras, zodiac_signs, properties,
    stock_quantity, is_active, is_featured, created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct CrystalRow {
    id: CrystalId,
    name: String,
    slug: String,
    category: String,
    price: Money,
    compare_at_price: Option<Money>,
    description: String,
    meta_title: Option<String>,
    meta_description: Option<String>,
    image_url: Option<String>,
    chakras: Vec<String>,
    zodiac_signs: Vec<String>,
    properties: Vec<String>,
    stock_quantity: i32,
    is_active: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CrystalRow> for Crystal {
    type Error = RepositoryError;

    fn try_from(row: CrystalRow) -> Result<Self, Self::Error> {
        let zodiac_signs = row
            .zodiac_signs
            .iter()
            .map(|s| s.parse::<ZodiacSign>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("crystal {}: {e}", row.slug))
            })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            category: row.category,
            price: row.price,
            compare_at_price: row.compare_at_price,
            description: row.description,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            image_url: row.image_url,
            chakras: row.chakras,
            zodiac_signs,
            properties: row.properties,
            stock_quantity: row.stock_quantity,
            is_active: row.is_active,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_crystals(rows: Vec<CrystalRow>) -> Result<Vec<Crystal>, RepositoryError> {
    rows.into_iter().map(Crystal::try_from).collect()
}

fn sign_names(signs: &[ZodiacSign]) -> Vec<String> {
    signs.iter().map(|s| s.as_str().to_owned()).collect()
}

/// Repository for crystal database operations.
pub struct CrystalRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CrystalRepository<'a> {
    /// Create a new crystal repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All crystals visible on the storefront, featured first then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored zodiac sign is unknown.
    pub async fn list_active(&self) -> Result<Vec<Crystal>, RepositoryError> {
        let rows: Vec<CrystalRow> = sqlx::query_as(&format!(
            "SELECT {CRYSTAL_COLUMNS} FROM shop.crystal
             WHERE is_active
             ORDER BY is_featured DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;

        into_crystals(rows)
    }

    /// Every crystal, including inactive ones, optionally filtered by a
    /// name/slug search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, search: Option<&str>) -> Result<Vec<Crystal>, RepositoryError> {
        let pattern = search_pattern(search);

        let rows: Vec<CrystalRow> = sqlx::query_as(&format!(
            "SELECT {CRYSTAL_COLUMNS} FROM shop.crystal
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR slug ILIKE $1)
             ORDER BY name"
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        into_crystals(rows)
    }

    /// Get a crystal by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CrystalId) -> Result<Option<Crystal>, RepositoryError> {
        let row: Option<CrystalRow> = sqlx::query_as(&format!(
            "SELECT {CRYSTAL_COLUMNS} FROM shop.crystal WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Crystal::try_from).transpose()
    }

    /// Get a crystal by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Crystal>, RepositoryError> {
        let row: Option<CrystalRow> = sqlx::query_as(&format!(
            "SELECT {CRYSTAL_COLUMNS} FROM shop.crystal WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Crystal::try_from).transpose()
    }

    /// Active crystals with `stock_quantity <= threshold`, emptiest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Crystal>, RepositoryError> {
        let rows: Vec<CrystalRow> = sqlx::query_as(&format!(
            "SELECT {CRYSTAL_COLUMNS} FROM shop.crystal
             WHERE is_active AND stock_quantity <= $1
             ORDER BY stock_quantity, name"
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        into_crystals(rows)
    }

    /// Adjust stock by `delta` and record the reason.
    ///
    /// Returns the new stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the crystal does not exist.
    /// Returns `RepositoryError::Conflict` if the adjustment would make stock negative.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        id: CrystalId,
        delta: i32,
        reason: &str,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i32,)> =
            sqlx::query_as("SELECT stock_quantity FROM shop.crystal WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (current,) = current.ok_or(RepositoryError::NotFound)?;
        let new_stock = current
            .checked_add(delta)
            .filter(|stock| *stock >= 0)
            .ok_or_else(|| {
                RepositoryError::Conflict(format!(
                    "stock cannot go below zero (current {current}, delta {delta})"
                ))
            })?;

        sqlx::query(
            "UPDATE shop.crystal SET stock_quantity = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(new_stock)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop.stock_adjustment (crystal_id, delta, reason) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(delta)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_stock)
    }

    /// Apply a partial update from the inventory dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the crystal does not exist.
    /// Returns `RepositoryError::Conflict` for a negative stock or price.
    pub async fn update(
        &self,
        id: CrystalId,
        update: &CrystalUpdate,
    ) -> Result<Crystal, RepositoryError> {
        if update.stock_quantity.is_some_and(|s| s < 0) {
            return Err(RepositoryError::Conflict(
                "stock cannot be negative".to_owned(),
            ));
        }
        if update.price.is_some_and(|p| p < Money::ZERO) {
            return Err(RepositoryError::Conflict(
                "price cannot be negative".to_owned(),
            ));
        }

        let row: Option<CrystalRow> = sqlx::query_as(&format!(
            "UPDATE shop.crystal SET
                price = COALESCE($2, price),
                compare_at_price = COALESCE($3, compare_at_price),
                stock_quantity = COALESCE($4, stock_quantity),
                is_active = COALESCE($5, is_active),
                is_featured = COALESCE($6, is_featured),
                meta_title = COALESCE($7, meta_title),
                meta_description = COALESCE($8, meta_description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {CRYSTAL_COLUMNS}"
        ))
        .bind(id)
        .bind(update.price)
        .bind(update.compare_at_price)
        .bind(update.stock_quantity)
        .bind(update.is_active)
        .bind(update.is_featured)
        .bind(update.meta_title.as_deref())
        .bind(update.meta_description.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Insert a crystal, or refresh catalog fields of an existing one with the
    /// same slug. Stock is only set on insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, crystal: &NewCrystal) -> Result<Crystal, RepositoryError> {
        let row: CrystalRow = sqlx::query_as(&format!(
            "INSERT INTO shop.crystal
                (name, slug, category, price, compare_at_price, description,
                 meta_title, meta_description, image_url, chakras, zodiac_signs,
                 properties, stock_quantity, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                price = EXCLUDED.price,
                compare_at_price = EXCLUDED.compare_at_price,
                description = EXCLUDED.description,
                meta_title = EXCLUDED.meta_title,
                meta_description = EXCLUDED.meta_description,
                image_url = EXCLUDED.image_url,
                chakras = EXCLUDED.chakras,
                zodiac_signs = EXCLUDED.zodiac_signs,
                properties = EXCLUDED.properties,
                is_featured = EXCLUDED.is_featured,
                updated_at = NOW()
             RETURNING {CRYSTAL_COLUMNS}"
        ))
        .bind(&crystal.name)
        .bind(&crystal.slug)
        .bind(&crystal.category)
        .bind(crystal.price)
        .bind(crystal.compare_at_price)
        .bind(&crystal.description)
        .bind(crystal.meta_title.as_deref())
        .bind(crystal.meta_description.as_deref())
        .bind(crystal.image_url.as_deref())
        .bind(&crystal.chakras)
        .bind(sign_names(&crystal.zodiac_signs))
        .bind(&crystal.properties)
        .bind(crystal.stock_quantity)
        .bind(crystal.is_featured)
        .fetch_one(self.pool)
        .await?;

        if row.stock_quantity == 0 {
            warn!(slug = %row.slug, "Upserted crystal has no stock");
        }

        row.try_into()
    }
}
