//! `GET /api/admin/seo`

use axum::{Json, extract::State};
use tracing::instrument;

use moonstone_db::{BlogPostRepository, CrystalRepository};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::seo::{SeoReport, audit};
use crate::state::AppState;

/// SEO report over active crystals and published posts.
#[instrument(skip(state, _admin))]
pub async fn report(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<SeoReport>> {
    let pool = state.pool();
    let crystal_repo = CrystalRepository::new(pool);
    let post_repo = BlogPostRepository::new(pool);
    let (crystals, posts) =
        tokio::try_join!(crystal_repo.list_active(), post_repo.list_published())?;

    Ok(Json(audit(
        &crystals,
        &posts,
        &state.config().storefront_url,
    )))
}
