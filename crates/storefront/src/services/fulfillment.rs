//! Stripe webhook processing.
//!
//! Stripe delivers events at least once. The only idempotency device is the
//! order's unique payment-intent id: an existing order short-circuits the
//! handler, and a unique violation from a concurrent delivery is reported as
//! a duplicate rather than an error.
//!
//! Prices come from the order metadata written at checkout (what the
//! customer was quoted), not from the catalog at delivery time.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use moonstone_core::{CrystalId, Email, Money, OrderStatus, PaymentStatus, UserId};
use moonstone_db::models::{NewOrder, NewOrderItem, NotificationKind, Order};
use moonstone_db::{
    CrystalRepository, LOW_STOCK_THRESHOLD, NotificationRepository,
    OrderRepository, RepositoryError, UserRepository,
};

use crate::cart::shipping_for;
use crate::services::email::EmailService;
use crate::stripe::types::event_types;
use crate::stripe::{
    Event, MetadataError, OrderPayload, PaymentIntent, SignatureError, metadata, signature,
};

/// Customer email recorded when a payment intent carries none.
pub const GUEST_EMAIL: &str = "guest@unknown";

/// Errors from webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing Stripe-Signature header")]
    MissingSignature,

    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("invalid event payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("unexpected event object: {0}")]
    InvalidObject(#[source] serde_json::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl WebhookError {
    /// Whether the request itself was rejected (answered with 400, so
    /// Stripe does not retry) rather than failing during processing.
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingSignature | Self::Signature(_) | Self::InvalidPayload(_)
        )
    }
}

/// Verify the signature header and parse the event.
///
/// # Errors
///
/// Returns `WebhookError::MissingSignature`, `WebhookError::Signature` or
/// `WebhookError::InvalidPayload`; all are verification failures.
pub fn verify_event(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<Event, WebhookError> {
    let header = signature_header.ok_or(WebhookError::MissingSignature)?;
    signature::verify(payload, header, secret, now, signature::DEFAULT_TOLERANCE_SECS)?;
    serde_json::from_slice(payload).map_err(WebhookError::InvalidPayload)
}

/// Response body for a processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
    /// Whether stock levels changed and cached catalog data is stale.
    #[serde(skip)]
    pub stock_changed: bool,
}

impl WebhookOutcome {
    #[must_use]
    pub const fn received() -> Self {
        Self {
            received: true,
            duplicate: false,
            stock_changed: false,
        }
    }

    #[must_use]
    pub const fn duplicate() -> Self {
        Self {
            received: true,
            duplicate: true,
            stock_changed: false,
        }
    }
}

/// What the webhook can reconstruct from a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    /// Metadata decoded: full order with items and shipping.
    Full(OrderPayload),
    /// Metadata absent or unreadable: email and captured amount only.
    Minimal { email: String, total: Money },
}

impl OrderSource {
    /// Decode the intent's metadata, falling back to a minimal order.
    #[must_use]
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        match metadata::decode(&intent.metadata) {
            Ok(payload) => Self::Full(payload),
            Err(err) => {
                if !matches!(err, MetadataError::Missing) {
                    tracing::warn!(
                        payment_intent = %intent.id,
                        error = %err,
                        "Order metadata unreadable, building minimal order"
                    );
                }
                Self::Minimal {
                    email: intent
                        .receipt_email
                        .clone()
                        .filter(|e| !e.trim().is_empty())
                        .unwrap_or_else(|| GUEST_EMAIL.to_owned()),
                    total: Money::from_cents(intent.captured_cents()),
                }
            }
        }
    }
}

/// Order lines with totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    pub items: Vec<NewOrderItem>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Price metadata items at the quoted unit prices.
///
/// Items whose crystal is not in `names` are skipped. Shipping follows the
/// cart's rule so the order mirrors what checkout charged.
#[must_use]
pub fn price_items(payload: &OrderPayload, names: &HashMap<i32, String>) -> PricedItems {
    let items: Vec<NewOrderItem> = payload
        .items
        .iter()
        .filter_map(|item| {
            let Some(name) = names.get(&item.crystal_id) else {
                tracing::warn!(crystal_id = item.crystal_id, "Unknown crystal in order metadata");
                return None;
            };
            let quantity = i32::try_from(item.quantity).ok().filter(|q| *q > 0)?;
            Some(NewOrderItem {
                crystal_id: CrystalId::new(item.crystal_id),
                crystal_name: name.clone(),
                unit_price: item.unit_price(),
                quantity,
            })
        })
        .collect();

    let subtotal: Money = items
        .iter()
        .map(|i| i.unit_price.times(u32::try_from(i.quantity).unwrap_or_default()))
        .sum();
    let shipping = shipping_for(subtotal);

    PricedItems {
        items,
        subtotal,
        shipping,
        total: subtotal + shipping,
    }
}

/// Side-effect handles for processing events.
pub struct Fulfillment<'a> {
    pool: &'a PgPool,
    email: Option<&'a EmailService>,
    admin_email: Option<&'a str>,
}

impl<'a> Fulfillment<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        email: Option<&'a EmailService>,
        admin_email: Option<&'a str>,
    ) -> Self {
        Self {
            pool,
            email,
            admin_email,
        }
    }

    /// Dispatch a verified event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event object cannot be decoded or a database
    /// write fails; the caller answers 500 so Stripe retries.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle(&self, event: &Event) -> Result<WebhookOutcome, WebhookError> {
        match event.event_type.as_str() {
            event_types::PAYMENT_INTENT_SUCCEEDED => {
                let intent = event.payment_intent().map_err(WebhookError::InvalidObject)?;
                self.payment_succeeded(&intent).await
            }
            event_types::PAYMENT_INTENT_FAILED => {
                let intent = event.payment_intent().map_err(WebhookError::InvalidObject)?;
                self.payment_failed(&intent).await?;
                Ok(WebhookOutcome::received())
            }
            event_types::CHARGE_REFUNDED => {
                let charge = event.charge().map_err(WebhookError::InvalidObject)?;
                if let Some(intent_id) = charge.payment_intent.as_deref() {
                    self.refunded(intent_id, charge.amount_refunded).await?;
                } else {
                    tracing::warn!(charge = %charge.id, "Refunded charge has no payment intent");
                }
                Ok(WebhookOutcome::received())
            }
            other => {
                tracing::debug!(event_type = other, "Ignoring event");
                Ok(WebhookOutcome::received())
            }
        }
    }

    async fn payment_succeeded(
        &self,
        intent: &PaymentIntent,
    ) -> Result<WebhookOutcome, WebhookError> {
        let orders = OrderRepository::new(self.pool);

        if orders.find_by_payment_intent(&intent.id).await?.is_some() {
            tracing::info!(payment_intent = %intent.id, "Order already exists, skipping");
            return Ok(WebhookOutcome::duplicate());
        }

        let new_order = match OrderSource::from_intent(intent) {
            OrderSource::Full(payload) => self.full_order(intent, &payload).await?,
            OrderSource::Minimal { email, total } => {
                let user_id = self.customer_id(&email, None, None).await?;
                NewOrder {
                    user_id,
                    customer_email: email,
                    customer_name: None,
                    shipping_address: None,
                    status: OrderStatus::Processing,
                    payment_status: PaymentStatus::Succeeded,
                    stripe_payment_intent_id: Some(intent.id.clone()),
                    subtotal: total,
                    shipping: Money::ZERO,
                    total,
                    items: Vec::new(),
                }
            }
        };

        let order = match orders.create(&new_order).await {
            Ok(order) => order,
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(payment_intent = %intent.id, "Concurrent delivery created the order");
                return Ok(WebhookOutcome::duplicate());
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            order = %order.order_number,
            payment_intent = %intent.id,
            total = %order.total,
            items = new_order.items.len(),
            "Order created from payment"
        );

        self.after_order(&order, &new_order).await;

        Ok(WebhookOutcome {
            stock_changed: !new_order.items.is_empty(),
            ..WebhookOutcome::received()
        })
    }

    async fn full_order(
        &self,
        intent: &PaymentIntent,
        payload: &OrderPayload,
    ) -> Result<NewOrder, WebhookError> {
        let crystals = CrystalRepository::new(self.pool);
        let mut names = HashMap::new();
        for item in &payload.items {
            if let Some(crystal) = crystals.get_by_id(CrystalId::new(item.crystal_id)).await? {
                names.insert(item.crystal_id, crystal.name);
            }
        }
        let priced = price_items(payload, &names);

        if priced.total.to_cents().ok() != Some(intent.captured_cents()) {
            tracing::warn!(
                payment_intent = %intent.id,
                computed = %priced.total,
                captured_cents = intent.captured_cents(),
                "Order total differs from captured amount"
            );
        }

        let user_id = self
            .customer_id(
                &payload.customer_email,
                payload.customer_name.as_deref(),
                payload.user_id.map(UserId::new),
            )
            .await?;

        let shipping_address = match &payload.shipping {
            Some(address) if address.missing_fields().is_empty() => Some(address.clone()),
            Some(address) => {
                tracing::warn!(missing = ?address.missing_fields(), "Incomplete shipping address");
                None
            }
            None => None,
        };

        Ok(NewOrder {
            user_id,
            customer_email: payload.customer_email.clone(),
            customer_name: payload.customer_name.clone(),
            shipping_address,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Succeeded,
            stripe_payment_intent_id: Some(intent.id.clone()),
            subtotal: priced.subtotal,
            shipping: priced.shipping,
            total: priced.total,
            items: priced.items,
        })
    }

    /// Resolve the account for an order: the signed-in user from checkout if
    /// it still exists, otherwise a customer upserted by email.
    async fn customer_id(
        &self,
        email: &str,
        name: Option<&str>,
        signed_in: Option<UserId>,
    ) -> Result<Option<UserId>, WebhookError> {
        let users = UserRepository::new(self.pool);

        if let Some(id) = signed_in
            && users.get_by_id(id).await?.is_some()
        {
            return Ok(Some(id));
        }

        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        Ok(Some(users.upsert_customer(&email, name).await?.id))
    }

    /// Notifications and email. Failures here are logged, never propagated:
    /// the order exists and Stripe must not retry.
    async fn after_order(&self, order: &Order, new_order: &NewOrder) {
        let notifications = NotificationRepository::new(self.pool);
        let message = format!(
            "New order {} from {} ({})",
            order.order_number,
            order.customer_email,
            order.total.display()
        );
        let payload = json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "total": order.total,
            "items": new_order.items.len(),
        });
        if let Err(err) = notifications
            .create(NotificationKind::NewOrder, &message, &payload)
            .await
        {
            tracing::error!(error = %err, "Failed to record order notification");
        }

        self.check_low_stock(new_order).await;

        let Some(email) = self.email else {
            return;
        };

        let orders = OrderRepository::new(self.pool);
        let detail = match orders.get_detail(order.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(error = %err, "Failed to load order for email");
                return;
            }
        };

        if order.customer_email != GUEST_EMAIL
            && let Err(err) = email
                .send_order_confirmation(order, &detail.items, detail.shipping_address.as_ref())
                .await
        {
            tracing::warn!(error = %err, order = %order.order_number, "Order confirmation email failed");
        }

        if let Some(admin) = self.admin_email
            && let Err(err) = email.send_admin_new_order(admin, order, &detail.items).await
        {
            tracing::warn!(error = %err, "Admin order notice failed");
        }
    }

    async fn check_low_stock(&self, new_order: &NewOrder) {
        let crystals = CrystalRepository::new(self.pool);
        let notifications = NotificationRepository::new(self.pool);

        for item in &new_order.items {
            let crystal = match crystals.get_by_id(item.crystal_id).await {
                Ok(Some(crystal)) => crystal,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "Low stock check failed");
                    return;
                }
            };
            if crystal.stock_quantity > LOW_STOCK_THRESHOLD {
                continue;
            }
            let message = format!(
                "{} is low on stock ({} left)",
                crystal.name, crystal.stock_quantity
            );
            let payload = json!({ "crystal_id": crystal.id, "stock": crystal.stock_quantity });
            if let Err(err) = notifications
                .create(NotificationKind::LowStock, &message, &payload)
                .await
            {
                tracing::warn!(error = %err, "Failed to record low stock notification");
            }
        }
    }

    async fn payment_failed(&self, intent: &PaymentIntent) -> Result<(), WebhookError> {
        let reason = intent
            .last_payment_error
            .as_ref()
            .and_then(|e| e.message.clone().or_else(|| e.code.clone()))
            .unwrap_or_else(|| "unknown reason".to_owned());

        tracing::warn!(payment_intent = %intent.id, %reason, "Payment failed");

        let email = intent.receipt_email.as_deref().unwrap_or(GUEST_EMAIL);
        let message = format!(
            "Payment of {} failed for {email}: {reason}",
            Money::from_cents(intent.amount).display()
        );
        NotificationRepository::new(self.pool)
            .create(
                NotificationKind::PaymentFailed,
                &message,
                &json!({ "payment_intent": intent.id, "amount": intent.amount, "reason": reason }),
            )
            .await?;
        Ok(())
    }

    async fn refunded(&self, intent_id: &str, amount_refunded: i64) -> Result<(), WebhookError> {
        let Some(order) = OrderRepository::new(self.pool)
            .mark_refunded(intent_id)
            .await?
        else {
            tracing::warn!(payment_intent = intent_id, "Refund for unknown order");
            return Ok(());
        };

        tracing::info!(order = %order.order_number, "Order refunded");

        let message = format!(
            "Order {} refunded ({})",
            order.order_number,
            Money::from_cents(amount_refunded).display()
        );
        NotificationRepository::new(self.pool)
            .create(
                NotificationKind::Refund,
                &message,
                &json!({ "order_id": order.id, "amount_refunded": amount_refunded }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stripe::CompactItem;

    const SECRET: &str = "whsec_test_secret";

    fn intent(metadata: HashMap<String, String>, receipt: Option<&str>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_test".to_owned(),
            amount: 5495,
            amount_received: 5495,
            currency: "usd".to_owned(),
            status: "succeeded".to_owned(),
            client_secret: None,
            receipt_email: receipt.map(str::to_owned),
            metadata,
            last_payment_error: None,
        }
    }

    fn payload() -> OrderPayload {
        OrderPayload {
            customer_email: "luna@example.com".to_owned(),
            customer_name: Some("Luna".to_owned()),
            shipping: None,
            user_id: None,
            items: vec![
                CompactItem {
                    crystal_id: 2,
                    quantity: 2,
                    unit_cents: 2200,
                },
                CompactItem {
                    crystal_id: 99,
                    quantity: 1,
                    unit_cents: 1000,
                },
            ],
        }
    }

    #[test]
    fn test_verify_event_requires_header() {
        let err = verify_event(b"{}", None, SECRET, 0).unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature));
        assert!(err.is_verification_failure());
    }

    #[test]
    fn test_verify_event_parses_signed_body() {
        let body = br#"{"id":"evt_1","type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
        let header = signature::sign(body, SECRET, 1_760_000_000).unwrap();
        let event = verify_event(body, Some(&header), SECRET, 1_760_000_010).unwrap();
        assert_eq!(event.event_type, "charge.refunded");
    }

    #[test]
    fn test_verify_event_rejects_tampered_body() {
        let header = signature::sign(b"{\"a\":1}", SECRET, 100).unwrap();
        let err = verify_event(b"{\"a\":2}", Some(&header), SECRET, 100).unwrap_err();
        assert!(matches!(err, WebhookError::Signature(SignatureError::NoMatch)));
    }

    #[test]
    fn test_verify_event_signed_garbage_is_bad_request() {
        let header = signature::sign(b"not json", SECRET, 100).unwrap();
        let err = verify_event(b"not json", Some(&header), SECRET, 100).unwrap_err();
        assert!(err.is_verification_failure());
    }

    #[test]
    fn test_processing_errors_are_retryable() {
        let err = WebhookError::Repository(RepositoryError::NotFound);
        assert!(!err.is_verification_failure());
    }

    #[test]
    fn test_order_source_full_from_metadata() {
        let encoded = metadata::encode(&payload()).unwrap();
        let source = OrderSource::from_intent(&intent(encoded.into_iter().collect(), None));
        assert_eq!(source, OrderSource::Full(payload()));
    }

    #[test]
    fn test_order_source_minimal_uses_receipt_email() {
        let source = OrderSource::from_intent(&intent(HashMap::new(), Some("sol@example.com")));
        assert_eq!(
            source,
            OrderSource::Minimal {
                email: "sol@example.com".to_owned(),
                total: Money::from_cents(5495),
            }
        );
    }

    #[test]
    fn test_order_source_minimal_guest_fallback() {
        let mut metadata = HashMap::new();
        metadata.insert("order_chunks".to_owned(), "2".to_owned());
        metadata.insert("order_0".to_owned(), "{".to_owned());
        let source = OrderSource::from_intent(&intent(metadata, None));
        assert!(matches!(source, OrderSource::Minimal { ref email, .. } if email == GUEST_EMAIL));
    }

    #[test]
    fn test_price_items_skips_unknown_and_adds_shipping() {
        let names = HashMap::from([(2, "Rose Quartz Heart".to_owned())]);
        let priced = price_items(&payload(), &names);

        assert_eq!(priced.items.len(), 1);
        assert_eq!(priced.items[0].crystal_name, "Rose Quartz Heart");
        assert_eq!(priced.subtotal, Money::from_cents(4400));
        assert_eq!(priced.shipping, Money::from_cents(595));
        assert_eq!(priced.total, Money::from_cents(4995));
    }

    #[test]
    fn test_outcome_json() {
        assert_eq!(
            serde_json::to_value(WebhookOutcome::received()).unwrap(),
            json!({"received": true})
        );
        assert_eq!(
            serde_json::to_value(WebhookOutcome::duplicate()).unwrap(),
            json!({"received": true, "duplicate": true})
        );
    }
}
