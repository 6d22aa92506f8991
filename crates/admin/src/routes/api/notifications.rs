//! Notification feed endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use moonstone_db::NotificationRepository;
use moonstone_db::models::Notification;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const FEED_LIMIT: i64 = 50;

/// How many notifications were marked read.
#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// `GET /api/admin/notifications`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Vec<Notification>>> {
    let feed = NotificationRepository::new(state.pool())
        .list_recent(FEED_LIMIT)
        .await?;
    Ok(Json(feed))
}

/// `POST /api/admin/notifications/read`
#[instrument(skip(state, _admin))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<MarkedRead>> {
    let updated = NotificationRepository::new(state.pool())
        .mark_all_read()
        .await?;
    Ok(Json(MarkedRead { updated }))
}
