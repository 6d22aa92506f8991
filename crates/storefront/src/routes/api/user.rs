//! `/api/user/*` endpoints for the signed-in customer.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use moonstone_core::{AddressId, Money};
use moonstone_db::models::{Address, NewAddress, Order, User};
use moonstone_db::{AddressRepository, OrderRepository, UserRepository};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Profile response body.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub order_count: usize,
    pub total_spent: Money,
}

/// `GET /api/user/profile`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let record = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let orders = OrderRepository::new(state.pool());
    let order_count = orders.list_for_user(user.id).await?.len();
    let total_spent = orders.total_spent(user.id).await?;

    Ok(Json(ProfileResponse {
        user: record,
        order_count,
        total_spent,
    }))
}

/// `GET /api/user/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/user/addresses`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// `POST /api/user/addresses`
#[instrument(skip(state, user, address), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(address): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let missing = address.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let created = AddressRepository::new(state.pool())
        .create(Some(user.id), &address)
        .await?;
    tracing::info!(address_id = %created.id, "Address saved");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /api/user/addresses/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, AddressId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
