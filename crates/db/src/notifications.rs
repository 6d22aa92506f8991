//! Admin notification repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Notification, NotificationKind};

/// Repository for the admin notification feed.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        kind: NotificationKind,
        message: &str,
        payload: &serde_json::Value,
    ) -> Result<Notification, RepositoryError> {
        let created = sqlx::query_as::<_, Notification>(
            r"
            INSERT INTO shop.notification (kind, message, payload)
            VALUES ($1, $2, $3)
            RETURNING id, kind, message, payload, is_read, created_at
            ",
        )
        .bind(kind.as_str())
        .bind(message)
        .bind(payload)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Most recent notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r"
            SELECT id, kind, message, payload, is_read, created_at
            FROM shop.notification
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark every notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE shop.notification SET is_read = TRUE WHERE NOT is_read")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
