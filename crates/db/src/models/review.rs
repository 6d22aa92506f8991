//! Product review types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use moonstone_core::{CrystalId, ReviewId, UserId};

/// A customer review of a crystal.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub crystal_id: CrystalId,
    pub user_id: UserId,
    /// Reviewer name at read time (joined from `shop.user`).
    pub author_name: Option<String>,
    pub rating: i16,
    pub title: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub crystal_id: CrystalId,
    pub user_id: UserId,
    pub rating: i16,
    pub title: Option<String>,
    pub body: String,
}

/// Review count and average for a crystal.
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub count: i64,
    pub average: Option<f64>,
}

impl RatingSummary {
    /// Average rounded to one decimal, e.g. `"4.5"`.
    #[must_use]
    pub fn display_average(&self) -> String {
        self.average
            .map_or_else(String::new, |avg| format!("{avg:.1}"))
    }
}
