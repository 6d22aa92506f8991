//! Admin router, in process.
//!
//! No session layer is installed, so every request is anonymous. The pool is
//! lazy: these routes must reject before touching the database.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use moonstone_admin::routes;
use moonstone_integration_tests::lazy_admin_state;

fn app() -> axum::Router {
    routes::routes().with_state(lazy_admin_state())
}

async fn send(method: Method, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    app().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_api_requires_auth() {
    let endpoints = [
        (Method::GET, "/api/admin/stats"),
        (Method::GET, "/api/admin/orders"),
        (Method::GET, "/api/admin/orders/1"),
        (Method::PATCH, "/api/admin/orders/1/status"),
        (Method::GET, "/api/admin/customers"),
        (Method::GET, "/api/admin/inventory?low_stock=true"),
        (Method::POST, "/api/admin/inventory/1/adjust"),
        (Method::GET, "/api/admin/subscribers/export"),
        (Method::DELETE, "/api/admin/subscribers/1"),
        (Method::POST, "/api/admin/campaigns/1/send"),
        (Method::GET, "/api/admin/seo"),
        (Method::GET, "/api/admin/notifications"),
        (Method::POST, "/api/admin/blog/generate"),
    ];

    for (method, uri) in endpoints {
        let response = send(method.clone(), uri).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should need a session"
        );
    }
}

#[tokio::test]
async fn test_api_rejection_is_json() {
    let response = send(Method::GET, "/api/admin/orders").await;
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_dashboard_redirects_to_login() {
    let response = send(Method::GET, "/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/auth/login"
    );
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = send(Method::GET, "/auth/login?error=not_admin").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("<form action=\"/auth/login\" method=\"post\">"));
    assert!(html.contains("This account does not have admin access."));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = send(Method::GET, "/api/admin/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
