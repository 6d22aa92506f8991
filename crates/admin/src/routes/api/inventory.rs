//! Inventory endpoints.
//!
//! Changes made here reach the storefront once its catalog cache expires.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use moonstone_core::CrystalId;
use moonstone_db::models::{Crystal, CrystalUpdate};
use moonstone_db::{CrystalRepository, LOW_STOCK_THRESHOLD};

use super::non_blank;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Query string for the inventory list.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub low_stock: bool,
    pub q: Option<String>,
}

/// Body of a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
    pub reason: String,
}

impl StockAdjustment {
    fn validate(&self) -> Result<&str> {
        if self.delta == 0 {
            return Err(AppError::BadRequest("delta must not be zero".to_string()));
        }
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("reason is required".to_string()));
        }
        Ok(reason)
    }
}

/// Result of a stock adjustment.
#[derive(Debug, Serialize)]
pub struct AdjustedStock {
    pub id: CrystalId,
    pub stock_quantity: i32,
    pub low_stock: bool,
}

/// Whether an update touches anything.
fn is_empty_update(update: &CrystalUpdate) -> bool {
    update.price.is_none()
        && update.compare_at_price.is_none()
        && update.stock_quantity.is_none()
        && update.is_active.is_none()
        && update.is_featured.is_none()
        && update.meta_title.is_none()
        && update.meta_description.is_none()
}

/// Case-insensitive name or slug match.
fn matches_search(crystal: &Crystal, term: &str) -> bool {
    let term = term.to_lowercase();
    crystal.name.to_lowercase().contains(&term) || crystal.slug.contains(&term)
}

/// `GET /api/admin/inventory`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Vec<Crystal>>> {
    let repo = CrystalRepository::new(state.pool());
    let search = non_blank(query.q);

    let crystals = if query.low_stock {
        let mut low = repo.low_stock(LOW_STOCK_THRESHOLD).await?;
        if let Some(term) = &search {
            low.retain(|c| matches_search(c, term));
        }
        low
    } else {
        repo.list_all(search.as_deref()).await?
    };

    Ok(Json(crystals))
}

/// `POST /api/admin/inventory/{id}/adjust`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, delta = body.delta))]
pub async fn adjust(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CrystalId>,
    Json(body): Json<StockAdjustment>,
) -> Result<Json<AdjustedStock>> {
    let reason = format!("{} ({})", body.validate()?, admin.email);

    let stock_quantity = CrystalRepository::new(state.pool())
        .adjust_stock(id, body.delta, &reason)
        .await?;

    tracing::info!(crystal_id = %id, stock_quantity, "Stock adjusted");
    Ok(Json(AdjustedStock {
        id,
        stock_quantity,
        low_stock: stock_quantity <= LOW_STOCK_THRESHOLD,
    }))
}

/// `PATCH /api/admin/inventory/{id}`
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CrystalId>,
    Json(update): Json<CrystalUpdate>,
) -> Result<Json<Crystal>> {
    if is_empty_update(&update) {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }

    let crystal = CrystalRepository::new(state.pool())
        .update(id, &update)
        .await?;

    tracing::info!(crystal = %crystal.slug, "Crystal updated");
    Ok(Json(crystal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonstone_db::fixtures::sample_catalog;

    use super::*;

    #[test]
    fn test_adjustment_validation() {
        let zero = StockAdjustment {
            delta: 0,
            reason: "recount".to_owned(),
        };
        assert!(zero.validate().is_err());

        let blank = StockAdjustment {
            delta: 3,
            reason: "   ".to_owned(),
        };
        assert!(blank.validate().is_err());

        let ok = StockAdjustment {
            delta: -2,
            reason: " broken in transit ".to_owned(),
        };
        assert_eq!(ok.validate().unwrap(), "broken in transit");
    }

    #[test]
    fn test_empty_update() {
        assert!(is_empty_update(&CrystalUpdate::default()));
        assert!(!is_empty_update(&CrystalUpdate {
            is_featured: Some(true),
            ..CrystalUpdate::default()
        }));
    }

    #[test]
    fn test_matches_search() {
        let catalog = sample_catalog();
        let amethyst = catalog.iter().find(|c| c.slug == "amethyst-cluster").unwrap();
        assert!(matches_search(amethyst, "AMETH"));
        assert!(!matches_search(amethyst, "quartz"));
    }

    #[test]
    fn test_update_body_accepts_partial_json() {
        let update: CrystalUpdate =
            serde_json::from_str(r#"{"is_active": false, "stock_quantity": 12}"#).unwrap();
        assert_eq!(update.is_active, Some(false));
        assert_eq!(update.stock_quantity, Some(12));
        assert!(update.price.is_none());
    }
}
