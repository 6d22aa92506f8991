//! HTTP tests against running binaries.
//!
//! These tests require:
//! - A migrated and seeded database
//! - The storefront running (`cargo run -p moonstone-storefront`)
//! - The admin running (`cargo run -p moonstone-admin`)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` for an account made with `ms-cli admin create`

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect};
use serde_json::{Value, json};

use moonstone_db::LOW_STOCK_THRESHOLD;
use moonstone_integration_tests::{admin_base_url, storefront_base_url};

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

/// Sign in to the admin and return the client holding the session cookie.
async fn admin_client() -> Client {
    let email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set");

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", admin_base_url()))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/");
    client
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_storefront_health() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_recommendations_for_sign() {
    let resp = client()
        .get(format!(
            "{}/api/recommendations?sign=pisces",
            storefront_base_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert!(body.to_string().contains("amethyst-cluster"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_cart_count_follows_session() {
    let client = client();
    let base = storefront_base_url();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("crystal_id", "1"), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains('2'), "{count}");
}

#[tokio::test]
#[ignore = "Requires running admin"]
async fn test_admin_api_rejects_anonymous() {
    let resp = client()
        .get(format!("{}/api/admin/stats", admin_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin and admin credentials"]
async fn test_admin_dashboards() {
    let client = admin_client().await;
    let base = admin_base_url();

    let stats: Value = client
        .get(format!("{base}/api/admin/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(stats["orders"]["total_orders"].is_number());

    let low: Vec<Value> = client
        .get(format!("{base}/api/admin/inventory?low_stock=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(low.iter().all(|c| c["stock_quantity"].as_i64().unwrap() <= i64::from(LOW_STOCK_THRESHOLD)));

    let bad = client
        .get(format!("{base}/api/admin/orders?status=teleported"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin and admin credentials"]
async fn test_admin_generates_draft_post() {
    let client = admin_client().await;
    let resp = client
        .post(format!("{}/api/admin/blog/generate", admin_base_url()))
        .json(&json!({ "topic": "root-chakra", "use_llm": false, "publish": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let post: Value = resp.json().await.unwrap();
    assert_eq!(post["source"], "template");
    assert_eq!(post["is_published"], false);
}

#[tokio::test]
#[ignore = "Requires running admin and admin credentials"]
async fn test_subscriber_export_is_csv() {
    let client = admin_client().await;
    let resp = client
        .get(format!("{}/api/admin/subscribers/export", admin_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("email,status,source,subscribed_at,unsubscribed_at"));
}
