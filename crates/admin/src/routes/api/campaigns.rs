//! Newsletter campaign endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use moonstone_core::CampaignId;
use moonstone_db::models::{Campaign, NewCampaign};
use moonstone_db::{CampaignRepository, RepositoryError, SubscriberRepository};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::services::CampaignDelivery;
use crate::state::AppState;

/// Result of sending a campaign.
#[derive(Debug, Serialize)]
pub struct SendResult {
    pub campaign: Campaign,
    pub delivery: CampaignDelivery,
}

/// Trim the fields of a new campaign and reject blanks.
fn validate(campaign: NewCampaign) -> Result<NewCampaign> {
    let campaign = NewCampaign {
        name: campaign.name.trim().to_owned(),
        subject: campaign.subject.trim().to_owned(),
        body_markdown: campaign.body_markdown.trim().to_owned(),
    };

    let missing: Vec<&str> = [
        ("name", &campaign.name),
        ("subject", &campaign.subject),
        ("body_markdown", &campaign.body_markdown),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(campaign)
    } else {
        Err(AppError::BadRequest(format!(
            "missing fields: {}",
            missing.join(", ")
        )))
    }
}

/// `GET /api/admin/campaigns`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Vec<Campaign>>> {
    Ok(Json(CampaignRepository::new(state.pool()).list().await?))
}

/// `POST /api/admin/campaigns`
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>)> {
    let campaign = CampaignRepository::new(state.pool())
        .create(&validate(body)?)
        .await?;
    tracing::info!(campaign_id = %campaign.id, "Campaign drafted");
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// `POST /api/admin/campaigns/{id}/send`
///
/// Claims the draft, mails it to every active subscriber, then marks it sent
/// with the number of addresses that accepted it. A campaign is only sent
/// once; a send interrupted part way stays `sending` and is not retried.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn send(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CampaignId>,
) -> Result<Json<SendResult>> {
    let email = state
        .email()
        .ok_or_else(|| AppError::BadRequest("SMTP is not configured".to_string()))?;

    let campaigns = CampaignRepository::new(state.pool());
    if campaigns.get(id).await?.is_none() {
        return Err(AppError::NotFound(format!("campaign {id}")));
    }
    let campaign = match campaigns.claim(id).await {
        Ok(campaign) => campaign,
        Err(RepositoryError::Conflict(_)) => {
            return Err(AppError::BadRequest("campaign was already sent".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let recipients = match SubscriberRepository::new(state.pool()).active_emails().await {
        Ok(recipients) => recipients,
        Err(err) => {
            campaigns.release(id).await?;
            return Err(err.into());
        }
    };
    let delivery = match email.send_campaign(&campaign, &recipients).await {
        Ok(delivery) => delivery,
        Err(err) => {
            campaigns.release(id).await?;
            return Err(err.into());
        }
    };

    let recipient_count = i32::try_from(delivery.sent).unwrap_or(i32::MAX);
    let campaign = campaigns.mark_sent(id, recipient_count).await?;

    tracing::info!(
        campaign_id = %id,
        sent = delivery.sent,
        failed = delivery.failed,
        "Campaign sent"
    );
    Ok(Json(SendResult { campaign, delivery }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims() {
        let campaign = validate(NewCampaign {
            name: " Full moon ".to_owned(),
            subject: " The harvest moon rises ".to_owned(),
            body_markdown: "Hello\n".to_owned(),
        })
        .unwrap();
        assert_eq!(campaign.name, "Full moon");
        assert_eq!(campaign.subject, "The harvest moon rises");
        assert_eq!(campaign.body_markdown, "Hello");
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let err = validate(NewCampaign {
            name: "Full moon".to_owned(),
            subject: "  ".to_owned(),
            body_markdown: String::new(),
        })
        .unwrap_err();
        assert!(
            matches!(err, AppError::BadRequest(ref msg) if msg == "missing fields: subject, body_markdown")
        );
    }
}
