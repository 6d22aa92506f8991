//! Admin notification feed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use moonstone_core::NotificationId;

/// A notification shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Kinds of notification written by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NewOrder,
    PaymentFailed,
    Refund,
    LowStock,
}

impl NotificationKind {
    /// Stored value of the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::PaymentFailed => "payment_failed",
            Self::Refund => "refund",
            Self::LowStock => "low_stock",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
