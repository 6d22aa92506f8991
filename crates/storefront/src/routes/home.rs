//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use moonstone_core::ZodiacSign;
use moonstone_db::BlogPostRepository;
use moonstone_db::models::{BlogPost, Crystal};

use crate::filters;
use crate::recommend::Intention;
use crate::state::AppState;

/// Featured crystals shown on the home page.
const FEATURED_COUNT: usize = 8;

/// Latest journal posts shown on the home page.
const LATEST_POSTS: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<Crystal>,
    pub latest_posts: Vec<BlogPost>,
    pub signs: [ZodiacSign; 12],
    pub intentions: [Intention; 6],
}

/// Display the home page.
///
/// Catalog or blog failures degrade to empty sections rather than an error
/// page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let featured = state.catalog().snapshot().await.map_or_else(
        |e| {
            tracing::error!("Failed to load catalog: {e}");
            Vec::new()
        },
        |crystals| {
            crystals
                .iter()
                .filter(|c| c.is_featured)
                .take(FEATURED_COUNT)
                .cloned()
                .collect()
        },
    );

    let latest_posts = BlogPostRepository::new(state.pool())
        .list_published()
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to load blog posts: {e}");
                Vec::new()
            },
            |posts| posts.into_iter().take(LATEST_POSTS).collect(),
        );

    HomeTemplate {
        featured,
        latest_posts,
        signs: ZodiacSign::ALL,
        intentions: Intention::ALL,
    }
}
