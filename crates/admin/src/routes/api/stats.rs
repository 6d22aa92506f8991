//! `GET /api/admin/stats`

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::DashboardStats;
use crate::state::AppState;

/// Dashboard numbers as JSON.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<DashboardStats>> {
    Ok(Json(DashboardStats::load(state.pool()).await?))
}
