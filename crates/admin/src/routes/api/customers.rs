//! Customer endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use moonstone_core::{Money, UserId};
use moonstone_db::models::{Address, CustomerFilter, CustomerSummary, Order, User};
use moonstone_db::{AddressRepository, OrderRepository, Page, UserRepository};

use super::non_blank;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Query string for the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// One customer with everything the detail view shows.
#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    pub user: User,
    pub addresses: Vec<Address>,
    pub orders: Vec<Order>,
    pub total_spent: Money,
}

/// `GET /api/admin/customers`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Page<CustomerSummary>>> {
    let filter = CustomerFilter {
        q: non_blank(query.q),
        page: query.page,
    };
    let page = UserRepository::new(state.pool())
        .list_customers(&filter)
        .await?;
    Ok(Json(page))
}

/// `GET /api/admin/customers/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<UserId>,
) -> Result<Json<CustomerDetail>> {
    let pool = state.pool();
    let user = UserRepository::new(pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    let addresses_repo = AddressRepository::new(pool);
    let orders_repo = OrderRepository::new(pool);
    let (addresses, orders, total_spent) = tokio::try_join!(
        addresses_repo.list_for_user(id),
        orders_repo.list_for_user(id),
        orders_repo.total_spent(id),
    )?;

    Ok(Json(CustomerDetail {
        user,
        addresses,
        orders,
        total_spent,
    }))
}
