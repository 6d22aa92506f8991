//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Dashboard (requires auth)
//! GET  /health                 - Health check
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # JSON API (requires auth, 401 otherwise)
//! GET    /api/admin/stats                   - Dashboard numbers
//! GET    /api/admin/orders                  - Orders (?status=&q=&from=&to=&page=)
//! GET    /api/admin/orders/{id}             - Order with items and address
//! PATCH  /api/admin/orders/{id}/status      - Move an order along its lifecycle
//! GET    /api/admin/customers               - Customers (?q=&page=)
//! GET    /api/admin/customers/{id}          - Profile, addresses and orders
//! GET    /api/admin/inventory               - Crystals (?low_stock=&q=)
//! PATCH  /api/admin/inventory/{id}          - Price, flags, stock
//! POST   /api/admin/inventory/{id}/adjust   - Stock delta with reason
//! GET    /api/admin/subscribers             - Subscribers (?status=&q=&page=)
//! GET    /api/admin/subscribers/export      - CSV download
//! DELETE /api/admin/subscribers/{id}        - Unsubscribe
//! GET    /api/admin/campaigns               - Campaigns
//! POST   /api/admin/campaigns               - New draft
//! POST   /api/admin/campaigns/{id}/send     - Send to active subscribers
//! GET    /api/admin/seo                     - SEO report
//! GET    /api/admin/notifications           - Recent notifications
//! POST   /api/admin/notifications/read      - Mark all read
//! GET    /api/admin/blog                    - All posts
//! POST   /api/admin/blog/generate           - Generate a post
//! PATCH  /api/admin/blog/{id}/publish       - Publish or unpublish
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the `/api/admin` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(api::stats::show))
        // Orders
        .route("/orders", get(api::orders::index))
        .route("/orders/{id}", get(api::orders::show))
        .route("/orders/{id}/status", patch(api::orders::update_status))
        // Customers
        .route("/customers", get(api::customers::index))
        .route("/customers/{id}", get(api::customers::show))
        // Inventory
        .route("/inventory", get(api::inventory::index))
        .route("/inventory/{id}", patch(api::inventory::update))
        .route("/inventory/{id}/adjust", post(api::inventory::adjust))
        // Newsletter
        .route("/subscribers", get(api::subscribers::index))
        .route("/subscribers/export", get(api::subscribers::export))
        .route("/subscribers/{id}", delete(api::subscribers::unsubscribe))
        .route(
            "/campaigns",
            get(api::campaigns::index).post(api::campaigns::create),
        )
        .route("/campaigns/{id}/send", post(api::campaigns::send))
        // Content
        .route("/seo", get(api::seo::report))
        .route("/blog", get(api::blog::index))
        .route("/blog/generate", post(api::blog::generate))
        .route("/blog/{id}/publish", patch(api::blog::set_published))
        // Feed
        .route("/notifications", get(api::notifications::index))
        .route("/notifications/read", post(api::notifications::mark_read))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/api/admin", api_routes())
}
