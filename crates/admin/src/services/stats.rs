//! Dashboard statistics.

use serde::Serialize;
use sqlx::PgPool;

use moonstone_db::models::{OrderStats, SubscriberCounts};
use moonstone_db::{
    CrystalRepository, LOW_STOCK_THRESHOLD, OrderRepository, RepositoryError,
    SubscriberRepository, UserRepository,
};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub orders: OrderStats,
    pub customers: i64,
    pub subscribers: SubscriberCounts,
    pub low_stock_count: usize,
    pub low_stock_threshold: i32,
}

impl DashboardStats {
    /// Gather the stats.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn load(pool: &PgPool) -> Result<Self, RepositoryError> {
        let order_repo = OrderRepository::new(pool);
        let user_repo = UserRepository::new(pool);
        let subscriber_repo = SubscriberRepository::new(pool);
        let crystal_repo = CrystalRepository::new(pool);
        let (orders, customers, subscribers, low_stock) = tokio::try_join!(
            order_repo.stats(),
            user_repo.count_customers(),
            subscriber_repo.count_by_status(),
            crystal_repo.low_stock(LOW_STOCK_THRESHOLD),
        )?;

        Ok(Self {
            orders,
            customers,
            subscribers,
            low_stock_count: low_stock.len(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        })
    }
}
