//! Dashboard page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use moonstone_db::models::{Crystal, Notification, Order, OrderFilter};
use moonstone_db::{CrystalRepository, LOW_STOCK_THRESHOLD, NotificationRepository, OrderRepository};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::services::DashboardStats;
use crate::state::AppState;

const RECENT_ORDERS: usize = 10;
const RECENT_NOTIFICATIONS: i64 = 10;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin: CurrentAdmin,
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
    pub low_stock: Vec<Crystal>,
    pub notifications: Vec<Notification>,
}

/// `GET /`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<DashboardTemplate> {
    let pool = state.pool();
    let stats = DashboardStats::load(pool).await?;

    let mut recent_orders = OrderRepository::new(pool)
        .list(&OrderFilter::default())
        .await?
        .items;
    recent_orders.truncate(RECENT_ORDERS);

    let low_stock = CrystalRepository::new(pool)
        .low_stock(LOW_STOCK_THRESHOLD)
        .await?;
    let notifications = NotificationRepository::new(pool)
        .list_recent(RECENT_NOTIFICATIONS)
        .await?;

    Ok(DashboardTemplate {
        admin,
        stats,
        recent_orders,
        low_stock,
        notifications,
    })
}
