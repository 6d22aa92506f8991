//! Blog post types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use moonstone_core::BlogPostId;

/// A blog post, written by hand or generated.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub meta_description: Option<String>,
    pub body_markdown: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    /// `manual`, `template` or `llm`.
    pub source: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Words in the markdown body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.body_markdown.split_whitespace().count()
    }
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub meta_description: Option<String>,
    pub body_markdown: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub source: String,
    pub publish: bool,
}
