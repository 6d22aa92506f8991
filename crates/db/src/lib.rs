//! Moonstone database layer.
//!
//! # Schema: `shop`
//!
//! One `PostgreSQL` database is shared by the storefront and the admin
//! binaries, so an order written by the Stripe webhook is immediately visible
//! on the admin dashboards.
//!
//! ## Tables
//!
//! - `user`, `user_password`, `address` - Customer and admin accounts
//! - `crystal`, `stock_adjustment` - Catalog and inventory audit trail
//! - `order`, `order_item` - Orders (one per Stripe payment intent)
//! - `review` - Product reviews
//! - `blog_post` - Blog content (manual and generated)
//! - `email_subscriber`, `email_campaign` - Newsletter
//! - `notification` - Admin notification feed
//! - `session`, `admin_session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `crates/db/migrations/` and are run via:
//! ```bash
//! cargo run -p moonstone-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod addresses;
pub mod blog_posts;
pub mod campaigns;
pub mod crystals;
pub mod fixtures;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod reviews;
pub mod subscribers;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use blog_posts::BlogPostRepository;
pub use campaigns::CampaignRepository;
pub use crystals::{CrystalRepository, LOW_STOCK_THRESHOLD};
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use reviews::ReviewRepository;
pub use subscribers::SubscriberRepository;
pub use users::UserRepository;

/// Default page size for admin list queries.
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`] with `message`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// One page of a list query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    pub page: u32,
    pub per_page: i64,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows.
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 0;
        }
        (self.total + self.per_page - 1) / self.per_page
    }
}

/// 1-based page number to SQL offset.
#[must_use]
pub fn page_offset(page: Option<u32>, per_page: i64) -> i64 {
    i64::from(page.unwrap_or(1).max(1) - 1) * per_page
}

/// `%term%` for ILIKE, or `None` for a blank search.
pub(crate) fn search_pattern(q: Option<&str>) -> Option<String> {
    q.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(None, 25), 0);
        assert_eq!(page_offset(Some(0), 25), 0);
        assert_eq!(page_offset(Some(1), 25), 0);
        assert_eq!(page_offset(Some(3), 25), 50);
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" luna ")), Some("%luna%".to_owned()));
        assert_eq!(search_pattern(Some("50%")), Some("%50\\%%".to_owned()));
    }

    #[test]
    fn test_total_pages() {
        let page = Page::<()> {
            items: Vec::new(),
            total: 51,
            page: 1,
            per_page: 25,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
