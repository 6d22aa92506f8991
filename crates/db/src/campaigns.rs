//! Email campaign repository.

use sqlx::PgPool;

use moonstone_core::{CampaignId, CampaignStatus};

use super::RepositoryError;
use crate::models::{Campaign, NewCampaign};

const CAMPAIGN_COLUMNS: &str =
    "id, name, subject, body_markdown, status, recipient_count, sent_at, created_at";

/// Repository for email campaigns.
pub struct CampaignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CampaignRepository<'a> {
    /// Create a new campaign repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a draft campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, campaign: &NewCampaign) -> Result<Campaign, RepositoryError> {
        let created = sqlx::query_as::<_, Campaign>(&format!(
            r"
            INSERT INTO shop.email_campaign (name, subject, body_markdown)
            VALUES ($1, $2, $3)
            RETURNING {CAMPAIGN_COLUMNS}
            "
        ))
        .bind(&campaign.name)
        .bind(&campaign.subject)
        .bind(&campaign.body_markdown)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// All campaigns, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let campaigns = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM shop.email_campaign ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(campaigns)
    }

    /// Get a campaign by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let campaign = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM shop.email_campaign WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(campaign)
    }

    /// Claim a draft campaign for sending.
    ///
    /// The status moves to `sending` in one statement, so of two concurrent
    /// requests only one gets the campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the campaign is not a draft
    /// (or does not exist).
    pub async fn claim(&self, id: CampaignId) -> Result<Campaign, RepositoryError> {
        self.transition(id, CampaignStatus::Draft, CampaignStatus::Sending)
            .await?
            .ok_or_else(|| RepositoryError::Conflict("campaign is not a draft".to_owned()))
    }

    /// Return a claimed campaign to draft after a send that delivered nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn release(&self, id: CampaignId) -> Result<(), RepositoryError> {
        self.transition(id, CampaignStatus::Sending, CampaignStatus::Draft)
            .await?;
        Ok(())
    }

    async fn transition(
        &self,
        id: CampaignId,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<Option<Campaign>, RepositoryError> {
        let campaign = sqlx::query_as::<_, Campaign>(&format!(
            r"
            UPDATE shop.email_campaign
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING {CAMPAIGN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        Ok(campaign)
    }

    /// Record a claimed campaign as sent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the campaign was not claimed
    /// with [`Self::claim`].
    pub async fn mark_sent(
        &self,
        id: CampaignId,
        recipient_count: i32,
    ) -> Result<Campaign, RepositoryError> {
        sqlx::query_as::<_, Campaign>(&format!(
            r"
            UPDATE shop.email_campaign
            SET status = $3, recipient_count = $2, sent_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING {CAMPAIGN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(recipient_count)
        .bind(CampaignStatus::Sent)
        .bind(CampaignStatus::Sending)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("campaign is not being sent".to_owned()))
    }
}
