//! Newsletter subscriber repository.

use sqlx::PgPool;
use tracing::instrument;

use moonstone_core::{Email, SubscriberId, SubscriberStatus};

use super::{DEFAULT_PAGE_SIZE, Page, RepositoryError, page_offset, search_pattern};
use crate::models::{Subscriber, SubscriberCounts, SubscriberFilter};

const SUBSCRIBER_COLUMNS: &str = "id, email, source, status, subscribed_at, unsubscribed_at";

/// Repository for newsletter subscribers.
pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe an email. Re-subscribing an unsubscribed address
    /// re-activates it; subscribing an active one is a no-op.
    ///
    /// Returns the subscriber and whether it was newly (re)activated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn subscribe(
        &self,
        email: &Email,
        source: &str,
    ) -> Result<(Subscriber, bool), RepositoryError> {
        let existing = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM shop.email_subscriber WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        if let Some(subscriber) = existing
            && subscriber.status == SubscriberStatus::Active
        {
            return Ok((subscriber, false));
        }

        let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
            r"
            INSERT INTO shop.email_subscriber (email, source)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
                SET status = 'active', subscribed_at = NOW(), unsubscribed_at = NULL
            RETURNING {SUBSCRIBER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(source)
        .fetch_one(self.pool)
        .await?;

        Ok((subscriber, true))
    }

    /// Unsubscribe by email. Returns `false` if the address is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unsubscribe(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.email_subscriber
            SET status = 'unsubscribed', unsubscribed_at = COALESCE(unsubscribed_at, NOW())
            WHERE email = $1
            ",
        )
        .bind(email)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unsubscribe by ID (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subscriber does not exist.
    pub async fn unsubscribe_by_id(&self, id: SubscriberId) -> Result<Subscriber, RepositoryError> {
        sqlx::query_as::<_, Subscriber>(&format!(
            r"
            UPDATE shop.email_subscriber
            SET status = 'unsubscribed', unsubscribed_at = COALESCE(unsubscribed_at, NOW())
            WHERE id = $1
            RETURNING {SUBSCRIBER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Paged subscriber list, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &SubscriberFilter) -> Result<Page<Subscriber>, RepositoryError> {
        let pattern = search_pattern(filter.q.as_deref());

        let (total,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM shop.email_subscriber
            WHERE ($1::shop.subscriber_status IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR email ILIKE $2)
            ",
        )
        .bind(filter.status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, Subscriber>(&format!(
            r"
            SELECT {SUBSCRIBER_COLUMNS} FROM shop.email_subscriber
            WHERE ($1::shop.subscriber_status IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR email ILIKE $2)
            ORDER BY subscribed_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(DEFAULT_PAGE_SIZE)
        .bind(page_offset(filter.page, DEFAULT_PAGE_SIZE))
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page: filter.page.unwrap_or(1).max(1),
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    /// Every subscriber matching a status (for CSV export).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<SubscriberStatus>,
    ) -> Result<Vec<Subscriber>, RepositoryError> {
        let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
            r"
            SELECT {SUBSCRIBER_COLUMNS} FROM shop.email_subscriber
            WHERE ($1::shop.subscriber_status IS NULL OR status = $1)
            ORDER BY subscribed_at, id
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Emails of all active subscribers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_emails(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT email FROM shop.email_subscriber WHERE status = 'active' ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    /// Totals by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<SubscriberCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, SubscriberCounts>(
            r"
            SELECT COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'unsubscribed') AS unsubscribed
            FROM shop.email_subscriber
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}
