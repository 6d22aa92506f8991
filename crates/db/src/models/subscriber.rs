//! Newsletter subscriber types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moonstone_core::{SubscriberId, SubscriberStatus};

/// An email newsletter subscriber.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    /// Where the signup came from (`footer`, `popup`, `checkout`, ...).
    pub source: String,
    pub status: SubscriberStatus,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// Filters for the admin subscriber list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriberFilter {
    pub status: Option<SubscriberStatus>,
    /// Substring match on email.
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Subscriber totals by status.
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct SubscriberCounts {
    pub active: i64,
    pub unsubscribed: i64,
}
