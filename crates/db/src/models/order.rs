//! Order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use moonstone_core::{
    AddressId, CrystalId, Money, OrderId, OrderItemId, OrderStatus, PaymentStatus, UserId,
};

use super::user::{Address, NewAddress};

/// A placed order.
///
/// `customer_email` is kept as a plain string: orders rebuilt from a
/// payment intent without metadata may only know `guest@unknown`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Human readable number, e.g. `MS-000042`.
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub shipping_address_id: Option<AddressId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on an order. Name and price are captured at purchase time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub crystal_id: CrystalId,
    pub crystal_name: String,
    pub unit_price: Money,
    pub quantity: i32,
}

impl OrderItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price
            .times(u32::try_from(self.quantity).unwrap_or_default())
    }
}

/// An order with its items and shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<Address>,
}

/// Input for [`crate::OrderRepository::create`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    /// Written in the order's transaction; reuses an identical saved address.
    pub shipping_address: Option<NewAddress>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub items: Vec<NewOrderItem>,
}

/// A line to insert with a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub crystal_id: CrystalId,
    pub crystal_name: String,
    pub unit_price: Money,
    pub quantity: i32,
}

/// Filters for the admin order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches email, customer name or order number.
    pub q: Option<String>,
    /// Inclusive start date (UTC).
    pub from: Option<NaiveDate>,
    /// Inclusive end date (UTC).
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
}

/// Aggregates for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct OrderStats {
    pub total_orders: i64,
    pub orders_today: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    /// Sum of totals for orders with a succeeded payment.
    pub revenue: Money,
    pub revenue_last_30_days: Money,
}
