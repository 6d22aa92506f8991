//! Checkout route handlers.
//!
//! The browser posts the shipping details here, we price the session cart
//! and create a Stripe `PaymentIntent` whose metadata carries the order. The
//! order row itself is written by the payment webhook once Stripe confirms
//! the charge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use moonstone_core::{Email, UserId};
use moonstone_db::models::NewAddress;

use crate::cart::PricedCart;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, session_keys};
use crate::routes::cart::priced_cart;
use crate::state::AppState;
use crate::stripe::{CompactItem, CreatePaymentIntent, MetadataError, OrderPayload, metadata};

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: PricedCart,
    pub publishable_key: String,
    pub return_url: String,
    pub email: String,
    pub name: String,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub payment_intent: Option<String>,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub name: Option<String>,
    pub shipping: NewAddress,
}

/// Checkout response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    /// Amount in cents.
    pub amount: i64,
}

/// Query Stripe appends to the return URL.
#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    pub payment_intent: Option<String>,
}

/// Build the metadata payload for a priced cart.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty cart, a line exceeding stock,
/// an invalid email, or an incomplete shipping address.
pub fn build_payload(
    cart: &PricedCart,
    request: &CheckoutRequest,
    user_id: Option<UserId>,
) -> Result<OrderPayload> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }
    if let Some(line) = cart.lines.iter().find(|l| l.exceeds_stock()) {
        return Err(AppError::BadRequest(format!(
            "Only {} of {} left in stock",
            line.available, line.name
        )));
    }

    let email = Email::parse(&request.email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;

    let missing = request.shipping.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing shipping fields: {}",
            missing.join(", ")
        )));
    }

    let items = cart
        .lines
        .iter()
        .map(|line| {
            line.unit_price
                .to_cents()
                .map(|unit_cents| CompactItem {
                    crystal_id: line.crystal_id.as_i32(),
                    quantity: line.quantity,
                    unit_cents,
                })
                .map_err(|e| AppError::Internal(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(OrderPayload {
        customer_email: email.into_inner(),
        customer_name: request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned),
        shipping: Some(request.shipping.clone()),
        user_id: user_id.map(|id| id.as_i32()),
        items,
    })
}

/// Display the checkout page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = priced_cart(&state, &session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let (email, name) = user.as_ref().map_or_else(
        || (String::new(), String::new()),
        |u: &CurrentUser| {
            (
                u.email.as_str().to_owned(),
                u.name.clone().unwrap_or_default(),
            )
        },
    );

    Ok(CheckoutTemplate {
        cart,
        publishable_key: state.config().stripe.publishable_key.clone(),
        return_url: format!("{}/checkout/complete", state.config().base_url),
        email,
        name,
    }
    .into_response())
}

/// Create a `PaymentIntent` for the session cart.
#[instrument(skip(state, session, user, request))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let cart = priced_cart(&state, &session).await?;
    let payload = build_payload(&cart, &request, user.map(|u| u.id))?;

    let metadata = metadata::encode(&payload).map_err(|e| match e {
        MetadataError::TooLarge { .. } => {
            AppError::BadRequest("Too many items for one order".to_string())
        }
        other => AppError::Internal(other.to_string()),
    })?;
    let amount_cents = cart
        .total
        .to_cents()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let intent = state
        .stripe()
        .create_payment_intent(&CreatePaymentIntent {
            amount_cents,
            currency: "usd",
            receipt_email: Some(payload.customer_email.clone()),
            description: Some(format!("Moonstone order ({} items)", cart.item_count())),
            metadata,
        })
        .await?;

    let client_secret = intent
        .client_secret
        .ok_or_else(|| AppError::Internal("payment intent without client secret".to_string()))?;

    tracing::info!(
        payment_intent = %intent.id,
        amount = amount_cents,
        "Checkout started"
    );

    Ok(Json(CheckoutResponse {
        client_secret,
        payment_intent_id: intent.id,
        amount: amount_cents,
    }))
}

/// Landing page after Stripe confirms payment. Empties the session cart.
#[instrument(skip(session))]
pub async fn complete(
    session: Session,
    Query(query): Query<CompleteQuery>,
) -> Result<impl IntoResponse> {
    session
        .remove::<crate::cart::Cart>(session_keys::CART)
        .await?;

    Ok(CheckoutCompleteTemplate {
        payment_intent: query.payment_intent,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use moonstone_core::CrystalId;
    use moonstone_db::fixtures::sample_catalog;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            email: " Luna@Example.com ".to_string(),
            name: Some("Luna Vale".to_string()),
            shipping: NewAddress {
                name: "Luna Vale".to_string(),
                line1: "12 Quartz Lane".to_string(),
                line2: None,
                city: "Sedona".to_string(),
                state: "AZ".to_string(),
                postal_code: "86336".to_string(),
                country: "US".to_string(),
            },
        }
    }

    fn cart_with_rose_quartz(quantity: u32) -> PricedCart {
        let catalog = sample_catalog();
        let crystal = catalog
            .iter()
            .find(|c| c.id == CrystalId::new(2))
            .unwrap();
        let mut cart = Cart::default();
        cart.add(crystal, quantity).unwrap();
        cart.priced(&catalog)
    }

    #[test]
    fn test_payload_carries_items_at_cart_prices() {
        let payload = build_payload(&cart_with_rose_quartz(2), &request(), Some(UserId::new(7)))
            .unwrap();

        assert_eq!(payload.customer_email, "luna@example.com");
        assert_eq!(payload.user_id, Some(7));
        assert_eq!(
            payload.items,
            vec![CompactItem {
                crystal_id: 2,
                quantity: 2,
                unit_cents: 2200,
            }]
        );
    }

    #[test]
    fn test_empty_cart_rejected() {
        let cart = Cart::default().priced(&sample_catalog());
        assert!(matches!(
            build_payload(&cart, &request(), None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_incomplete_address_rejected() {
        let mut req = request();
        req.shipping.postal_code = String::new();
        let err = build_payload(&cart_with_rose_quartz(1), &req, None).unwrap_err();
        assert!(err.to_string().contains("postal_code"));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut req = request();
        req.email = "not-an-email".to_string();
        assert!(build_payload(&cart_with_rose_quartz(1), &req, None).is_err());
    }
}
