//! Stripe webhook endpoint.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::error::Result;
use crate::services::fulfillment::{Fulfillment, WebhookOutcome, verify_event};
use crate::state::AppState;
use crate::stripe::signature::SIGNATURE_HEADER;

/// Receive a Stripe event.
///
/// Verification failures answer 400 so Stripe stops retrying; processing
/// failures answer 500 so it retries later.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = verify_event(
        &body,
        signature,
        state.config().stripe.webhook_secret.expose_secret(),
        chrono::Utc::now().timestamp(),
    )
    .inspect_err(|e| tracing::warn!(error = %e, "Rejected webhook"))?;

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Webhook received");

    let outcome = Fulfillment::new(
        state.pool(),
        state.email(),
        state.config().admin_notification_email.as_deref(),
    )
    .handle(&event)
    .await?;

    if outcome.stock_changed {
        state.catalog().invalidate().await;
    }

    Ok(Json(outcome))
}
