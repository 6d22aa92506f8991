//! Blog post repository.

use sqlx::PgPool;
use tracing::instrument;

use moonstone_core::BlogPostId;

use super::RepositoryError;
use crate::models::{BlogPost, NewBlogPost};

const POST_COLUMNS: &str = r"
    id, title, slug, excerpt, meta_description, body_markdown, image_url, tags,
    source, is_published, published_at, created_at, updated_at
";

/// Repository for blog posts.
pub struct BlogPostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogPostRepository<'a> {
    /// Create a new blog post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM shop.blog_post
            WHERE is_published
            ORDER BY published_at DESC NULLS LAST, id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(posts)
    }

    /// Every post, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_post ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(posts)
    }

    /// Get a post by slug (drafts included).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_post WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(post)
    }

    /// Whether a slug is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM shop.blog_post WHERE slug = $1)")
                .bind(slug)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, post), fields(slug = %post.slug, source = %post.source))]
    pub async fn create(&self, post: &NewBlogPost) -> Result<BlogPost, RepositoryError> {
        let created = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            INSERT INTO shop.blog_post
                (title, slug, excerpt, meta_description, body_markdown, image_url, tags,
                 source, is_published, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $9 THEN NOW() END)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(post.meta_description.as_deref())
        .bind(&post.body_markdown)
        .bind(post.image_url.as_deref())
        .bind(&post.tags)
        .bind(&post.source)
        .bind(post.publish)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug already exists"))?;

        Ok(created)
    }

    /// Publish or unpublish a post. `published_at` is set the first time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn set_published(
        &self,
        id: BlogPostId,
        published: bool,
    ) -> Result<BlogPost, RepositoryError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r"
            UPDATE shop.blog_post
            SET is_published = $2,
                published_at = CASE WHEN $2 THEN COALESCE(published_at, NOW()) ELSE published_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(published)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
