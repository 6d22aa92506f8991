//! Stripe API object subsets used by checkout and the webhook.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

/// The object the event is about, kept raw until the type is known.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl Event {
    /// Decode `data.object` as a `PaymentIntent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not a payment intent.
    pub fn payment_intent(&self) -> Result<PaymentIntent, serde_json::Error> {
        PaymentIntent::deserialize(&self.data.object)
    }

    /// Decode `data.object` as a `Charge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not a charge.
    pub fn charge(&self) -> Result<Charge, serde_json::Error> {
        Charge::deserialize(&self.data.object)
    }
}

/// Event types the storefront acts on.
pub mod event_types {
    pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
    pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";
    pub const CHARGE_REFUNDED: &str = "charge.refunded";
}

/// A `PaymentIntent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_received: i64,
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

impl PaymentIntent {
    /// Amount actually captured, falling back to the requested amount.
    #[must_use]
    pub const fn captured_cents(&self) -> i64 {
        if self.amount_received > 0 {
            self.amount_received
        } else {
            self.amount
        }
    }
}

/// Why a payment attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A `Charge` (only what refunds need).
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub refunded: bool,
}

/// Parameters for creating a `PaymentIntent`.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    pub amount_cents: i64,
    pub currency: &'static str,
    pub receipt_email: Option<String>,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl CreatePaymentIntent {
    /// Stripe's bracketed form encoding of the request.
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_owned(), self.amount_cents.to_string()),
            ("currency".to_owned(), self.currency.to_owned()),
            (
                "automatic_payment_methods[enabled]".to_owned(),
                "true".to_owned(),
            ),
        ];
        if let Some(email) = &self.receipt_email {
            params.push(("receipt_email".to_owned(), email.clone()));
        }
        if let Some(description) = &self.description {
            params.push(("description".to_owned(), description.clone()));
        }
        params.extend(
            self.metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
        );
        params
    }
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_decodes_payment_intent() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "evt_1",
                "type": "payment_intent.succeeded",
                "created": 1760000000,
                "data": {"object": {
                    "id": "pi_123",
                    "object": "payment_intent",
                    "amount": 5495,
                    "amount_received": 5495,
                    "currency": "usd",
                    "status": "succeeded",
                    "receipt_email": "luna@example.com",
                    "metadata": {"order_chunks": "1", "order_0": "{}"}
                }}
            }"#,
        )
        .unwrap();

        assert_eq!(event.event_type, event_types::PAYMENT_INTENT_SUCCEEDED);
        let intent = event.payment_intent().unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.captured_cents(), 5495);
        assert_eq!(intent.metadata.len(), 2);
    }

    #[test]
    fn test_captured_cents_falls_back_to_amount() {
        let intent: PaymentIntent =
            serde_json::from_str(r#"{"id":"pi_1","amount":1200,"currency":"usd"}"#).unwrap();
        assert_eq!(intent.captured_cents(), 1200);
    }

    #[test]
    fn test_form_params_bracket_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("order_chunks".to_owned(), "1".to_owned());
        let request = CreatePaymentIntent {
            amount_cents: 5495,
            currency: "usd",
            receipt_email: Some("luna@example.com".to_owned()),
            description: None,
            metadata,
        };

        let params = request.form_params();
        assert!(params.contains(&("amount".to_owned(), "5495".to_owned())));
        assert!(params.contains(&("metadata[order_chunks]".to_owned(), "1".to_owned())));
        assert!(params.contains(&("receipt_email".to_owned(), "luna@example.com".to_owned())));
    }
}
