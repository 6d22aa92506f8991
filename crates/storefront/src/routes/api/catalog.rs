//! Public catalog and recommendation endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use moonstone_core::{Element, ZodiacSign};

use crate::catalog::{self, CatalogPage, CatalogQuery};
use crate::error::{AppError, Result};
use crate::recommend::{self, DEFAULT_LIMIT, Intention, Recommendation};
use crate::state::AppState;

/// Largest `limit` a caller may ask for.
const MAX_LIMIT: usize = 20;

/// Recommendation query: either `sign` or a birth `month` and `day`.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub sign: Option<String>,
    pub intention: Option<String>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub limit: Option<usize>,
}

impl RecommendationQuery {
    /// The sign named directly, or derived from the birth date.
    pub(crate) fn sign(&self) -> Result<ZodiacSign> {
        if let Some(sign) = self.sign.as_deref().filter(|s| !s.trim().is_empty()) {
            return sign
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Unknown zodiac sign: {sign}")));
        }
        match (self.month, self.day) {
            (Some(month), Some(day)) => ZodiacSign::from_birth_date(month, day)
                .ok_or_else(|| AppError::BadRequest("Invalid birth date".to_string())),
            _ => Err(AppError::BadRequest(
                "Provide a sign or a birth month and day".to_string(),
            )),
        }
    }

    pub(crate) fn intention(&self) -> Result<Option<Intention>> {
        self.intention
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse().map_err(AppError::BadRequest))
            .transpose()
    }

    /// Whether the caller asked for anything at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.sign.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.month.is_none()
            && self.day.is_none()
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Recommendation response body.
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub sign: ZodiacSign,
    pub element: Element,
    pub intention: Option<Intention>,
    pub recommendations: Vec<Recommendation>,
}

/// `GET /api/products`: the listing query as JSON.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>> {
    let crystals = state.catalog().snapshot().await?;
    Ok(Json(catalog::apply(&crystals, &query)))
}

/// `GET /api/recommendations`: crystals for a sign and optional intention.
#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>> {
    let sign = query.sign()?;
    let intention = query.intention()?;
    let crystals = state.catalog().snapshot().await?;

    Ok(Json(RecommendationResponse {
        sign,
        element: sign.element(),
        intention,
        recommendations: recommend::recommend(&crystals, sign, intention, query.limit()),
    }))
}
