//! Cart route handlers.
//!
//! Cart operations use HTMX-style fragments for updates without full page
//! reloads. The cart itself lives in the session under
//! [`session_keys::CART`] and is priced against the catalog on every render.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use moonstone_core::CrystalId;

use crate::cart::{Cart, PricedCart};
use crate::error::Result;
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, empty if there is none.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Price the session cart against the current catalog.
pub async fn priced_cart(state: &AppState, session: &Session) -> Result<PricedCart> {
    let cart = load_cart(session).await;
    let crystals = state.catalog().snapshot().await?;
    Ok(cart.priced(&crystals))
}

/// Whether the request came from a fragment swap rather than a plain form.
fn is_fragment_request(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub crystal_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub crystal_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub crystal_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: PricedCart,
}

/// Cart drawer fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub cart: PricedCart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: PricedCart,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let cart = priced_cart(&state, &session).await?;
    Ok(CartShowTemplate { cart })
}

/// Cart drawer contents (HTMX).
#[instrument(skip(state, session))]
pub async fn drawer(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let cart = priced_cart(&state, &session).await?;
    Ok(CartDrawerTemplate { cart })
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an `HX-Trigger` so the drawer refreshes.
/// Plain form posts are redirected to the cart page.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let Some(crystal) = state
        .catalog()
        .by_id(CrystalId::new(form.crystal_id))
        .await?
    else {
        return Ok((
            StatusCode::NOT_FOUND,
            Html("<span class=\"cart-error\">That crystal is no longer available</span>"),
        )
            .into_response());
    };

    let mut cart = load_cart(&session).await;
    if let Err(e) = cart.add(&crystal, form.quantity.unwrap_or(1)) {
        tracing::info!(crystal = %crystal.slug, "Add to cart refused: {e}");
        return Ok((
            StatusCode::CONFLICT,
            Html(format!("<span class=\"cart-error\">{e}</span>")),
        )
            .into_response());
    }
    save_cart(&session, &cart).await?;

    if !is_fragment_request(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX). A quantity of zero removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let crystal_id = CrystalId::new(form.crystal_id);
    let mut cart = load_cart(&session).await;

    match state.catalog().by_id(crystal_id).await? {
        Some(crystal) => {
            cart.update(&crystal, form.quantity);
        }
        None => cart.remove(crystal_id),
    }
    save_cart(&session, &cart).await?;

    cart_items_response(&state, &cart, &headers).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    cart.remove(CrystalId::new(form.crystal_id));
    save_cart(&session, &cart).await?;

    cart_items_response(&state, &cart, &headers).await
}

async fn cart_items_response(
    state: &AppState,
    cart: &Cart,
    headers: &HeaderMap,
) -> Result<Response> {
    if !is_fragment_request(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let crystals = state.catalog().snapshot().await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart.priced(&crystals),
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let count = load_cart(&session).await.item_count();
    CartCountTemplate { count }
}
