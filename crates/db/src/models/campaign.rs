//! Email campaign types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moonstone_core::{CampaignId, CampaignStatus};

/// A newsletter campaign.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub subject: String,
    pub body_markdown: String,
    pub status: CampaignStatus,
    /// Number of subscribers the campaign was sent to.
    pub recipient_count: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a draft campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub subject: String,
    pub body_markdown: String,
}
