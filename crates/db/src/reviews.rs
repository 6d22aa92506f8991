//! Review repository.

use sqlx::PgPool;

use moonstone_core::CrystalId;

use super::RepositoryError;
use crate::models::{NewReview, RatingSummary, Review};

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a crystal, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_crystal(
        &self,
        crystal_id: CrystalId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.crystal_id, r.user_id, u.name AS author_name,
                   r.rating, r.title, r.body, r.created_at
            FROM shop.review r
            JOIN shop.user u ON u.id = r.user_id
            WHERE r.crystal_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(crystal_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// rating outside 1..=5, which the schema rejects).
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let created = sqlx::query_as::<_, Review>(
            r"
            WITH inserted AS (
                INSERT INTO shop.review (crystal_id, user_id, rating, title, body)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT i.id, i.crystal_id, i.user_id, u.name AS author_name,
                   i.rating, i.title, i.body, i.created_at
            FROM inserted i
            JOIN shop.user u ON u.id = i.user_id
            ",
        )
        .bind(review.crystal_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(review.title.as_deref())
        .bind(&review.body)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Count and average rating for a crystal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_summary(
        &self,
        crystal_id: CrystalId,
    ) -> Result<RatingSummary, RepositoryError> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r"
            SELECT COUNT(*) AS count, AVG(rating)::FLOAT8 AS average
            FROM shop.review
            WHERE crystal_id = $1
            ",
        )
        .bind(crystal_id)
        .fetch_one(self.pool)
        .await?;

        Ok(summary)
    }
}
