//! Stripe webhook processing against `PostgreSQL`.
//!
//! Events are fed straight to `Fulfillment::handle`, after signature checks,
//! without mail configured.
//!
//! These tests require `DATABASE_URL` pointing at a scratch database.
//! Run with: `cargo test -p moonstone-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use serde_json::json;
use sqlx::PgPool;

use moonstone_core::{Email, Money, OrderStatus, PaymentStatus};
use moonstone_db::fixtures::CRYSTALS;
use moonstone_db::models::{Crystal, NewAddress, Order};
use moonstone_db::{AddressRepository, CrystalRepository, OrderRepository, UserRepository};
use moonstone_integration_tests::{test_pool, unique_email};
use moonstone_storefront::services::fulfillment::{Fulfillment, GUEST_EMAIL, WebhookOutcome};
use moonstone_storefront::stripe::{CompactItem, Event, OrderPayload, metadata};

/// A crystal of its own, so stock assertions do not race other tests.
async fn scratch_crystal(pool: &PgPool, stock: i32) -> Crystal {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let mut crystal = CRYSTALS[0].to_new_crystal();
    crystal.name = format!("{} {}", crystal.name, &suffix[..8]);
    crystal.slug = format!("{}-{}", crystal.slug, &suffix[..8]);
    crystal.stock_quantity = stock;
    CrystalRepository::new(pool).upsert(&crystal).await.unwrap()
}

fn intent_id() -> String {
    format!("pi_{}", uuid::Uuid::new_v4().simple())
}

fn address() -> NewAddress {
    NewAddress {
        name: "Luna Vale".to_string(),
        line1: "12 Quartz Lane".to_string(),
        line2: None,
        city: "Sedona".to_string(),
        state: "AZ".to_string(),
        postal_code: "86336".to_string(),
        country: "US".to_string(),
    }
}

fn payload(email: &str, crystal: &Crystal, quantity: u32) -> OrderPayload {
    OrderPayload {
        customer_email: email.to_string(),
        customer_name: Some("Luna Vale".to_string()),
        shipping: Some(address()),
        user_id: None,
        items: vec![CompactItem {
            crystal_id: crystal.id.as_i32(),
            quantity,
            unit_cents: crystal.price.to_cents().unwrap(),
        }],
    }
}

fn succeeded(intent: &str, payload: Option<&OrderPayload>, receipt: Option<&str>) -> Event {
    let metadata = payload.map(|p| metadata::encode(p).unwrap()).unwrap_or_default();
    serde_json::from_value(json!({
        "id": format!("evt_{intent}"),
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": intent,
            "amount": 5495,
            "amount_received": 5495,
            "currency": "usd",
            "status": "succeeded",
            "receipt_email": receipt,
            "metadata": metadata,
        }},
    }))
    .unwrap()
}

fn refunded(intent: &str) -> Event {
    serde_json::from_value(json!({
        "id": format!("evt_refund_{intent}"),
        "type": "charge.refunded",
        "data": { "object": {
            "id": format!("ch_{intent}"),
            "payment_intent": intent,
            "amount": 5495,
            "amount_refunded": 5495,
            "refunded": true,
        }},
    }))
    .unwrap()
}

async fn order_for(pool: &PgPool, intent: &str) -> Order {
    OrderRepository::new(pool)
        .find_by_payment_intent(intent)
        .await
        .unwrap()
        .unwrap()
}

async fn stock_of(pool: &PgPool, crystal: &Crystal) -> i32 {
    CrystalRepository::new(pool)
        .get_by_id(crystal.id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

async fn saved_addresses(pool: &PgPool, email: &str) -> usize {
    let user = UserRepository::new(pool)
        .get_by_email(&Email::parse(email).unwrap())
        .await
        .unwrap()
        .unwrap();
    AddressRepository::new(pool)
        .list_for_user(user.id)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_payment_succeeded_creates_processing_order_and_decrements_stock() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 5).await;
    let email = unique_email("paid");
    let intent = intent_id();

    let outcome = Fulfillment::new(&pool, None, None)
        .handle(&succeeded(&intent, Some(&payload(&email, &crystal, 2)), None))
        .await
        .unwrap();
    assert!(outcome.received);
    assert!(!outcome.duplicate);

    let order = order_for(&pool, &intent).await;
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Succeeded);
    assert_eq!(order.customer_email, email);
    assert!(order.shipping_address_id.is_some());

    let items = OrderRepository::new(&pool).items(order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price, crystal.price);

    assert_eq!(stock_of(&pool, &crystal).await, 3);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_redelivered_event_is_acknowledged_as_duplicate() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 5).await;
    let email = unique_email("redelivered");
    let intent = intent_id();
    let event = succeeded(&intent, Some(&payload(&email, &crystal, 1)), None);
    let fulfillment = Fulfillment::new(&pool, None, None);

    fulfillment.handle(&event).await.unwrap();
    let again = fulfillment.handle(&event).await.unwrap();

    assert_eq!(again, WebhookOutcome::duplicate());
    assert_eq!(
        serde_json::to_value(&again).unwrap(),
        json!({"received": true, "duplicate": true})
    );
    assert_eq!(stock_of(&pool, &crystal).await, 4);
    assert_eq!(saved_addresses(&pool, &email).await, 1);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_concurrent_deliveries_write_one_order_and_one_address() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 5).await;
    let email = unique_email("concurrent");
    let intent = intent_id();
    let event = succeeded(&intent, Some(&payload(&email, &crystal, 1)), None);

    let fulfillment_a = Fulfillment::new(&pool, None, None);
    let fulfillment_b = Fulfillment::new(&pool, None, None);
    let (first, second) = tokio::join!(
        fulfillment_a.handle(&event),
        fulfillment_b.handle(&event),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.duplicate).count(), 1);
    assert_eq!(stock_of(&pool, &crystal).await, 4);
    assert_eq!(saved_addresses(&pool, &email).await, 1);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_repeat_customer_reuses_saved_address() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 10).await;
    let email = unique_email("repeat");
    let fulfillment = Fulfillment::new(&pool, None, None);

    let (first, second) = (intent_id(), intent_id());
    for intent in [&first, &second] {
        fulfillment
            .handle(&succeeded(intent, Some(&payload(&email, &crystal, 1)), None))
            .await
            .unwrap();
    }

    assert_eq!(saved_addresses(&pool, &email).await, 1);
    assert_eq!(
        order_for(&pool, &first).await.shipping_address_id,
        order_for(&pool, &second).await.shipping_address_id
    );
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_missing_metadata_builds_minimal_order() {
    let pool = test_pool().await;
    let email = unique_email("minimal");
    let intent = intent_id();

    Fulfillment::new(&pool, None, None)
        .handle(&succeeded(&intent, None, Some(&email)))
        .await
        .unwrap();

    let order = order_for(&pool, &intent).await;
    assert_eq!(order.customer_email, email);
    assert_eq!(order.total, Money::from_cents(5495));
    assert_eq!(order.shipping_address_id, None);
    assert!(
        OrderRepository::new(&pool)
            .items(order.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_minimal_order_without_receipt_is_guest() {
    let pool = test_pool().await;
    let intent = intent_id();

    Fulfillment::new(&pool, None, None)
        .handle(&succeeded(&intent, None, None))
        .await
        .unwrap();

    let order = order_for(&pool, &intent).await;
    assert_eq!(order.customer_email, GUEST_EMAIL);
    assert_eq!(order.user_id, None);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_short_stock_is_clamped_at_zero() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 1).await;
    let intent = intent_id();

    Fulfillment::new(&pool, None, None)
        .handle(&succeeded(
            &intent,
            Some(&payload(&unique_email("short"), &crystal, 3)),
            None,
        ))
        .await
        .unwrap();

    let items = OrderRepository::new(&pool)
        .items(order_for(&pool, &intent).await.id)
        .await
        .unwrap();
    assert_eq!(items[0].quantity, 3);
    assert_eq!(stock_of(&pool, &crystal).await, 0);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_charge_refunded_marks_order_refunded() {
    let pool = test_pool().await;
    let crystal = scratch_crystal(&pool, 5).await;
    let intent = intent_id();
    let fulfillment = Fulfillment::new(&pool, None, None);

    fulfillment
        .handle(&succeeded(
            &intent,
            Some(&payload(&unique_email("refund"), &crystal, 1)),
            None,
        ))
        .await
        .unwrap();
    let outcome = fulfillment.handle(&refunded(&intent)).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::received());

    let order = order_for(&pool, &intent).await;
    assert_eq!(order.status, OrderStatus::Refunded);
    assert_eq!(order.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_refund_for_unknown_intent_is_acknowledged() {
    let pool = test_pool().await;
    let outcome = Fulfillment::new(&pool, None, None)
        .handle(&refunded(&intent_id()))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::received());
}
