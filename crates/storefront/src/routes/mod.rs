//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (filters in query string)
//! GET  /products/category/:category - Category listing
//! GET  /products/:slug         - Product detail with reviews
//! GET  /products/:slug/quick-view - Quick view fragment (HTMX)
//! POST /products/:slug/reviews - Post a review (requires auth)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! GET  /cart/drawer            - Cart drawer fragment
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout page (Stripe payment element)
//! POST /checkout               - Create payment intent (JSON)
//! GET  /checkout/complete      - Stripe return URL
//! POST /api/webhooks/stripe    - Stripe events
//!
//! # Zodiac
//! GET  /zodiac                 - Crystal quiz
//! GET  /api/recommendations    - Recommendations (JSON)
//! GET  /api/products           - Catalog query (JSON)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /api/user/profile       - Profile (JSON)
//! GET  /api/user/orders        - Order history (JSON)
//! GET  /api/user/addresses     - Saved addresses (JSON)
//! POST /api/user/addresses     - Save an address (JSON)
//! DELETE /api/user/addresses/:id - Delete an address
//!
//! # Content
//! POST /newsletter/subscribe   - Subscribe (fragment)
//! GET  /newsletter/unsubscribe - Unsubscribe link target
//! GET  /blog                   - Journal index
//! GET  /blog/:slug             - Journal post
//! GET  /pages/:slug            - Static markdown page
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod newsletter;
pub mod pages;
pub mod products;
pub mod webhooks;
pub mod zodiac;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/category/{category}", get(products::category))
        .route("/{slug}", get(products::show))
        .route("/{slug}/quick-view", get(products::quick_view))
}

/// Form posts that write on behalf of anonymous or signed-in visitors.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{slug}/reviews", post(products::create_review))
        .route("/newsletter/subscribe", post(newsletter::subscribe))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/drawer", get(cart::drawer))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).post(checkout::create_payment_intent),
        )
        .route("/complete", get(checkout::complete))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::catalog::products))
        .route("/recommendations", get(api::catalog::recommendations))
        .route("/user/profile", get(api::user::profile))
        .route("/user/orders", get(api::user::orders))
        .route(
            "/user/addresses",
            get(api::user::addresses).post(api::user::create_address),
        )
        .route("/user/addresses/{id}", delete(api::user::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .route("/zodiac", get(zodiac::quiz))
        // Content
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
        .route("/pages/{slug}", get(pages::show))
        .route("/newsletter/unsubscribe", get(newsletter::unsubscribe))
        // Account
        .route("/account", get(account::index))
        // Stripe calls this; it is authenticated by signature, not rate limited
        .route("/api/webhooks/stripe", post(webhooks::stripe))
        // Rate limited groups
        .merge(form_routes().layer(form_rate_limiter()))
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/cart", cart_routes().layer(api_rate_limiter()))
        .nest("/checkout", checkout_routes().layer(api_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}
