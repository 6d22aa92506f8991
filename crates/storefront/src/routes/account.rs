//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use moonstone_core::Money;
use moonstone_db::models::{Address, Order};
use moonstone_db::{AddressRepository, OrderRepository};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub user: CurrentUser,
    pub orders: Vec<Order>,
    pub addresses: Vec<Address>,
    pub total_spent: Money,
}

impl AccountIndexTemplate {
    fn greeting(&self) -> String {
        self.user
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.user.email.greeting_name())
    }
}

/// Display account overview page.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let order_repo = OrderRepository::new(state.pool());
    let orders = order_repo.list_for_user(user.id).await?;
    let total_spent = order_repo.total_spent(user.id).await?;
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(AccountIndexTemplate {
        user,
        orders,
        addresses,
        total_spent,
    })
}
