//! Order repository.
//!
//! Orders are created by the Stripe webhook and managed from the admin
//! dashboard. `stripe_payment_intent_id` is unique, so a redelivered webhook
//! cannot create a second order for the same payment.

use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use moonstone_core::{Money, OrderId, OrderStatus, PaymentStatus, UserId};

use super::addresses;
use super::{DEFAULT_PAGE_SIZE, Page, RepositoryError, page_offset, search_pattern};
use crate::models::{
    Address, NewOrder, Order, OrderDetail, OrderFilter, OrderItem, OrderStats,
};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, customer_email, customer_name, shipping_address_id,
    status, payment_status, stripe_payment_intent_id, subtotal, shipping, total,
    created_at, updated_at
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the order created for a Stripe payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM shop."order" WHERE stripe_payment_intent_id = $1"#
        ))
        .bind(payment_intent_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Insert an order, its items and its shipping address and decrement
    /// stock, in one transaction.
    ///
    /// Stock is clamped at zero: the customer has already paid, so a shortfall
    /// is logged for the admin rather than failing the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order already exists for the
    /// payment intent.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new_order), fields(
        payment_intent = ?new_order.stripe_payment_intent_id,
        items = new_order.items.len()
    ))]
    pub async fn create(&self, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let shipping_address_id = match &new_order.shipping_address {
            Some(address) => {
                Some(addresses::save_for_order(&mut *tx, new_order.user_id, address).await?)
            }
            None => None,
        };

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO shop."order"
                (user_id, customer_email, customer_name, shipping_address_id, status,
                 payment_status, stripe_payment_intent_id, subtotal, shipping, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new_order.user_id)
        .bind(&new_order.customer_email)
        .bind(new_order.customer_name.as_deref())
        .bind(shipping_address_id)
        .bind(new_order.status)
        .bind(new_order.payment_status)
        .bind(new_order.stripe_payment_intent_id.as_deref())
        .bind(new_order.subtotal)
        .bind(new_order.shipping)
        .bind(new_order.total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "order already exists for payment intent"))?;

        for item in &new_order.items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, crystal_id, crystal_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id)
            .bind(item.crystal_id)
            .bind(&item.crystal_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            let stock: Option<(i32,)> = sqlx::query_as(
                "SELECT stock_quantity FROM shop.crystal WHERE id = $1 FOR UPDATE",
            )
            .bind(item.crystal_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((available,)) = stock
                && available < item.quantity
            {
                warn!(
                    order = %order.order_number,
                    crystal_id = %item.crystal_id,
                    available,
                    ordered = item.quantity,
                    "Insufficient stock for paid order, clamping to zero"
                );
            }

            sqlx::query(
                r"
                UPDATE shop.crystal
                SET stock_quantity = GREATEST(stock_quantity - $2, 0), updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(item.crystal_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(order = %order.order_number, "Order created");
        Ok(order)
    }

    /// List orders for the admin dashboard, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<Order>, RepositoryError> {
        let pattern = search_pattern(filter.q.as_deref());
        let offset = page_offset(filter.page, DEFAULT_PAGE_SIZE);

        let where_clause = r"
            WHERE ($1::shop.order_status IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR customer_email ILIKE $2
                   OR customer_name ILIKE $2 OR order_number ILIKE $2)
              AND ($3::DATE IS NULL OR created_at >= $3::DATE)
              AND ($4::DATE IS NULL OR created_at < $4::DATE + 1)
        ";

        let (total,): (i64,) = sqlx::query_as(&format!(
            r#"SELECT COUNT(*) FROM shop."order" {where_clause}"#
        ))
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM shop."order"
            {where_clause}
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .bind(DEFAULT_PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page: filter.page.unwrap_or(1).max(1),
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM shop."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, crystal_id, crystal_name, unit_price, quantity
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// An order with items and shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let items = self.items(id).await?;

        let shipping_address = match order.shipping_address_id {
            Some(address_id) => {
                sqlx::query_as::<_, Address>(
                    r"
                    SELECT id, user_id, name, line1, line2, city, state, postal_code,
                           country, is_default, created_at
                    FROM shop.address
                    WHERE id = $1
                    ",
                )
                .bind(address_id)
                .fetch_optional(self.pool)
                .await?
            }
            None => None,
        };

        Ok(Some(OrderDetail {
            order,
            items,
            shipping_address,
        }))
    }

    /// Move an order to `next`, enforcing the status lifecycle.
    ///
    /// Moving to `REFUNDED` also marks the payment refunded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderStatus,)> =
            sqlx::query_as(r#"SELECT status FROM shop."order" WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (current,) = current.ok_or(RepositoryError::NotFound)?;
        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {current} to {next}"
            )));
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE shop."order"
            SET status = $2,
                payment_status = CASE WHEN $2 = 'REFUNDED'::shop.order_status
                                      THEN 'REFUNDED'::shop.payment_status
                                      ELSE payment_status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Mark the order for a refunded payment intent as refunded.
    ///
    /// Stripe is authoritative for refunds, so the lifecycle check is skipped.
    /// Returns `None` when no order matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_refunded(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE shop."order"
            SET status = $2, payment_status = $3, updated_at = NOW()
            WHERE stripe_payment_intent_id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(payment_intent_id)
        .bind(OrderStatus::Refunded)
        .bind(PaymentStatus::Refunded)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM shop."order"
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Dashboard aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, OrderStats>(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE created_at >= CURRENT_DATE) AS orders_today,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_orders,
                COUNT(*) FILTER (WHERE status = 'PROCESSING') AS processing_orders,
                COALESCE(SUM(total) FILTER (WHERE payment_status = 'SUCCEEDED'), 0)::NUMERIC(12, 2)
                    AS revenue,
                COALESCE(SUM(total) FILTER (
                    WHERE payment_status = 'SUCCEEDED'
                      AND created_at >= NOW() - INTERVAL '30 days'
                ), 0)::NUMERIC(12, 2) AS revenue_last_30_days
            FROM shop."order"
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// Revenue of succeeded payments for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_spent(&self, user_id: UserId) -> Result<Money, RepositoryError> {
        let (total,): (Money,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total), 0)
            FROM shop."order"
            WHERE user_id = $1 AND payment_status = 'SUCCEEDED'
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }
}
