//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use moonstone_db::BlogPostRepository;
use moonstone_db::models::BlogPost;

use crate::content::{reading_time_minutes, render_markdown};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Number of recent posts to show under a post.
const RECENT_POSTS_COUNT: usize = 3;

/// Post view for templates.
#[derive(Clone)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub meta_description: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
}

impl From<&BlogPost> for PostView {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            meta_description: post
                .meta_description
                .clone()
                .unwrap_or_else(|| post.excerpt.clone()),
            image_url: post.image_url.clone(),
            tags: post.tags.clone(),
            published_at: post.published_at,
            reading_time_minutes: reading_time_minutes(post.word_count()),
        }
    }
}

impl PostView {
    /// Publication date as shown on the page, e.g. "March 3, 2026".
    #[must_use]
    pub fn published_label(&self) -> String {
        self.published_at
            .map(|at| at.format("%B %-d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub posts: Vec<PostView>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub post: PostView,
    pub content_html: String,
    pub recent_posts: Vec<PostView>,
    /// Base URL for canonical links.
    pub base_url: String,
}

/// Display the blog index page with all published posts.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let posts = BlogPostRepository::new(state.pool())
        .list_published()
        .await?
        .iter()
        .map(PostView::from)
        .collect();

    Ok(BlogIndexTemplate { posts })
}

/// Display a single blog post by slug.
///
/// # Errors
///
/// Returns 404 if the post doesn't exist or is unpublished.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let repo = BlogPostRepository::new(state.pool());
    let post = repo
        .get_by_slug(&slug)
        .await?
        .filter(|post| post.is_published)
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;

    let recent_posts = repo
        .list_published()
        .await?
        .iter()
        .filter(|p| p.slug != post.slug)
        .take(RECENT_POSTS_COUNT)
        .map(PostView::from)
        .collect();

    Ok(BlogShowTemplate {
        post: PostView::from(&post),
        content_html: render_markdown(&post.body_markdown),
        recent_posts,
        base_url: state.config().base_url.clone(),
    })
}
