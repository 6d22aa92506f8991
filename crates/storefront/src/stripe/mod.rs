//! Stripe REST client, webhook signatures and order metadata.
//!
//! Only the slice of the API the shop needs: creating `PaymentIntent`s at
//! checkout and decoding the events Stripe posts back.

pub mod metadata;
pub mod signature;
pub mod types;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

pub use metadata::{CompactItem, MetadataError, OrderPayload};
pub use signature::SignatureError;
pub use types::{Charge, CreatePaymentIntent, Event, PaymentIntent};

use crate::config::StripeConfig;
use types::ApiErrorBody;

/// Errors that can occur when talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the request.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },
}

impl StripeError {
    /// Whether the failure is attributable to the request (e.g. a declined
    /// card) rather than to Stripe or the network.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 400 && *status < 500 && *status != 401,
            Self::Http(_) => false,
        }
    }
}

/// Stripe API client.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    secret_key: SecretString,
    api_base: String,
}

impl StripeClient {
    /// Create a new client from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                secret_key: config.secret_key.clone(),
                api_base: config.api_base.trim_end_matches('/').to_owned(),
            }),
        }
    }

    /// Create a `PaymentIntent`.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe rejects the request, or
    /// `StripeError::Http` on transport failure.
    #[instrument(skip(self, request), fields(amount = request.amount_cents))]
    pub async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let url = format!("{}/v1/payment_intents", self.inner.api_base);

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&request.form_params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, code) = serde_json::from_str::<ApiErrorBody>(&body).map_or_else(
                |_| (format!("Stripe returned {status}"), None),
                |parsed| {
                    (
                        parsed
                            .error
                            .message
                            .unwrap_or_else(|| format!("Stripe returned {status}")),
                        parsed.error.code,
                    )
                },
            );
            tracing::warn!(status = status.as_u16(), ?code, %message, "Stripe request failed");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
                code,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        tracing::info!(payment_intent = %intent.id, "Created payment intent");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let declined = StripeError::Api {
            status: 402,
            message: "Your card was declined.".to_owned(),
            code: Some("card_declined".to_owned()),
        };
        assert!(declined.is_client_error());

        let bad_key = StripeError::Api {
            status: 401,
            message: "Invalid API Key".to_owned(),
            code: None,
        };
        assert!(!bad_key.is_client_error());

        let outage = StripeError::Api {
            status: 503,
            message: "unavailable".to_owned(),
            code: None,
        };
        assert!(!outage.is_client_error());
    }
}
