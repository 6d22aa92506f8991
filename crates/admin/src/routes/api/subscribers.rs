//! Newsletter subscriber endpoints.

use std::fmt::Write;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use moonstone_core::{SubscriberId, SubscriberStatus};
use moonstone_db::models::{Subscriber, SubscriberCounts, SubscriberFilter};
use moonstone_db::{Page, SubscriberRepository};

use super::{non_blank, parse_param};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Query string for the subscriber list and export.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriberQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// A page of subscribers plus totals by status.
#[derive(Debug, Serialize)]
pub struct SubscriberList {
    #[serde(flatten)]
    pub page: Page<Subscriber>,
    pub counts: SubscriberCounts,
}

/// `GET /api/admin/subscribers`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<SubscriberList>> {
    let filter = SubscriberFilter {
        status: parse_param::<SubscriberStatus>(query.status, "status")?,
        q: non_blank(query.q),
        page: query.page,
    };

    let repo = SubscriberRepository::new(state.pool());
    let (page, counts) = tokio::try_join!(repo.list(&filter), repo.count_by_status())?;

    Ok(Json(SubscriberList { page, counts }))
}

/// `DELETE /api/admin/subscribers/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<SubscriberId>,
) -> Result<Json<Subscriber>> {
    let subscriber = SubscriberRepository::new(state.pool())
        .unsubscribe_by_id(id)
        .await?;
    tracing::info!(subscriber_id = %id, "Subscriber removed by admin");
    Ok(Json(subscriber))
}

/// `GET /api/admin/subscribers/export`
///
/// Downloads every subscriber (optionally one status) as CSV.
#[instrument(skip(state, _admin))]
pub async fn export(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<SubscriberQuery>,
) -> Result<impl IntoResponse> {
    let status = parse_param::<SubscriberStatus>(query.status, "status")?;
    let subscribers = SubscriberRepository::new(state.pool())
        .list_all(status)
        .await?;

    let filename = format!(
        "subscribers-{}.csv",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        subscribers_csv(&subscribers),
    ))
}

/// Render subscribers as CSV with a header row.
#[must_use]
pub fn subscribers_csv(subscribers: &[Subscriber]) -> String {
    let mut csv = String::from("email,status,source,subscribed_at,unsubscribed_at\n");
    for s in subscribers {
        let _ = writeln!(
            csv,
            "{},{},{},{},{}",
            csv_field(&s.email),
            csv_field(s.status.as_str()),
            csv_field(&s.source),
            s.subscribed_at.to_rfc3339(),
            s.unsubscribed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        );
    }
    csv
}

/// Quote a field when needed and neutralize spreadsheet formulas.
fn csv_field(value: &str) -> String {
    let value = if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_owned()
    };

    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("luna@example.com"), "luna@example.com");
        assert_eq!(csv_field("footer, popup"), "\"footer, popup\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("=HYPERLINK(1)"), "'=HYPERLINK(1)");
    }

    #[test]
    fn test_subscribers_csv() {
        let subscribed_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let rows = vec![Subscriber {
            id: SubscriberId::new(1),
            email: "luna@example.com".to_string(),
            source: "footer".to_string(),
            status: SubscriberStatus::Active,
            subscribed_at,
            unsubscribed_at: None,
        }];

        let csv = subscribers_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("email,status,source,subscribed_at,unsubscribed_at")
        );
        assert_eq!(
            lines.next(),
            Some("luna@example.com,active,footer,2026-03-01T12:00:00+00:00,")
        );
        assert_eq!(lines.next(), None);
    }
}
