//! Blog post management and generation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use moonstone_core::BlogPostId;
use moonstone_db::models::BlogPost;
use moonstone_db::{BlogPostRepository, CrystalRepository};

use super::non_blank;
use crate::content::{LlmGenerator, TemplateGenerator, Topic, find_topic, next_topic, save_post};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Body of a generate request.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Topic key; the next unused topic when absent.
    pub topic: Option<String>,
    #[serde(default)]
    pub use_llm: bool,
    #[serde(default)]
    pub publish: bool,
}

/// Body of a publish toggle.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

/// Resolve the requested topic key against the existing posts.
fn resolve_topic(key: Option<String>, existing: &[BlogPost]) -> Result<&'static Topic> {
    match non_blank(key) {
        Some(key) => {
            find_topic(&key).ok_or_else(|| AppError::BadRequest(format!("unknown topic: {key}")))
        }
        None => {
            let slugs: Vec<String> = existing.iter().map(|p| p.slug.clone()).collect();
            Ok(next_topic(&slugs))
        }
    }
}

/// `GET /api/admin/blog`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(BlogPostRepository::new(state.pool()).list_all().await?))
}

/// `POST /api/admin/blog/generate`
///
/// With `use_llm` the post is written by Claude when an API key is
/// configured; otherwise, or if Claude fails, the template generator writes it.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn generate(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let pool = state.pool();
    let posts = BlogPostRepository::new(pool);
    let crystals = CrystalRepository::new(pool);
    let (existing, catalog) = tokio::try_join!(posts.list_all(), crystals.list_active())?;
    let topic = resolve_topic(request.topic, &existing)?;

    let generated = if request.use_llm {
        LlmGenerator::new(state.claude().cloned())
            .generate(topic, &catalog)
            .await
    } else {
        TemplateGenerator.generate(topic, &catalog)
    };

    let post = save_post(pool, generated, request.publish).await?;
    tracing::info!(
        topic = topic.key,
        slug = %post.slug,
        source = %post.source,
        "Blog post generated"
    );
    Ok((StatusCode::CREATED, Json(post)))
}

/// `PATCH /api/admin/blog/{id}/publish`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn set_published(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<BlogPostId>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<BlogPost>> {
    let post = BlogPostRepository::new(state.pool())
        .set_published(id, request.published)
        .await?;
    Ok(Json(post))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_topic() {
        let topic = resolve_topic(Some(" heart-chakra ".to_owned()), &[]).unwrap();
        assert_eq!(topic.key, "heart-chakra");
    }

    #[test]
    fn test_resolve_unknown_topic_is_bad_request() {
        assert!(matches!(
            resolve_topic(Some("astral-projection".to_owned()), &[]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_resolve_without_key_picks_first_unused() {
        let topic = resolve_topic(None, &[]).unwrap();
        assert_eq!(topic.key, crate::content::TOPICS[0].key);
    }

    #[test]
    fn test_generate_request_defaults() {
        let request: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.topic.is_none());
        assert!(!request.use_llm);
        assert!(!request.publish);
    }
}
