//! Order management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use moonstone_core::{OrderId, OrderStatus};
use moonstone_db::models::{Order, OrderDetail, OrderFilter};
use moonstone_db::{OrderRepository, Page};

use super::{non_blank, parse_date, parse_param};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Raw query string for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
}

impl OrderQuery {
    /// Validate into a repository filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown status, a malformed
    /// date, or a range that ends before it starts.
    pub fn into_filter(self) -> Result<OrderFilter> {
        let from = parse_date(self.from, "from")?;
        let to = parse_date(self.to, "to")?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(AppError::BadRequest(
                "from must not be after to".to_string(),
            ));
        }

        Ok(OrderFilter {
            status: parse_param::<OrderStatus>(self.status, "status")?,
            q: non_blank(self.q),
            from,
            to,
            page: self.page,
        })
    }
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// `GET /api/admin/orders`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let filter = query.into_filter()?;
    let page = OrderRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

/// `GET /api/admin/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// `PATCH /api/admin/orders/{id}/status`
///
/// Transitions the order lifecycle does not allow are rejected with 400.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let next: OrderStatus = body
        .status
        .parse()
        .map_err(|e: moonstone_core::ParseStatusError| AppError::BadRequest(e.to_string()))?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, next)
        .await?;

    tracing::info!(order = %order.order_number, status = %next, "Order status updated");
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_empty_query_is_unfiltered() {
        let filter = OrderQuery::default().into_filter().unwrap();
        assert!(filter.status.is_none());
        assert!(filter.q.is_none());
        assert!(filter.from.is_none());
        assert!(filter.page.is_none());
    }

    #[test]
    fn test_query_parses_lowercase_status_and_dates() {
        let filter = OrderQuery {
            status: Some("processing".to_owned()),
            q: Some("  MS-1042 ".to_owned()),
            from: Some("2026-01-01".to_owned()),
            to: Some("2026-01-31".to_owned()),
            page: Some(2),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.status, Some(OrderStatus::Processing));
        assert_eq!(filter.q.as_deref(), Some("MS-1042"));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(filter.page, Some(2));
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad_status = OrderQuery {
            status: Some("teleported".to_owned()),
            ..OrderQuery::default()
        };
        assert!(matches!(bad_status.into_filter(), Err(AppError::BadRequest(_))));

        let inverted = OrderQuery {
            from: Some("2026-02-01".to_owned()),
            to: Some("2026-01-01".to_owned()),
            ..OrderQuery::default()
        };
        assert!(matches!(inverted.into_filter(), Err(AppError::BadRequest(_))));
    }
}
