//! `/api/admin/*` JSON endpoints.
//!
//! Query strings arrive as plain strings and are parsed here so that a bad
//! value produces a 400 with a readable message instead of an extractor
//! rejection.

pub mod blog;
pub mod campaigns;
pub mod customers;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod seo;
pub mod stats;
pub mod subscribers;

use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{AppError, Result};

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse an optional query parameter, treating blank as absent.
pub(crate) fn parse_param<T: FromStr>(value: Option<String>, name: &str) -> Result<Option<T>> {
    non_blank(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("invalid {name}: {v}")))
        })
        .transpose()
}

/// Parse an optional `YYYY-MM-DD` date parameter.
pub(crate) fn parse_date(value: Option<String>, name: &str) -> Result<Option<NaiveDate>> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("invalid {name}: expected YYYY-MM-DD")))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonstone_core::OrderStatus;

    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("  ".to_owned())), None);
        assert_eq!(non_blank(Some(" luna ".to_owned())), Some("luna".to_owned()));
    }

    #[test]
    fn test_parse_param() {
        let status: Option<OrderStatus> = parse_param(Some("shipped".to_owned()), "status").unwrap();
        assert_eq!(status, Some(OrderStatus::Shipped));
        assert!(parse_param::<OrderStatus>(Some(String::new()), "status").unwrap().is_none());
        assert!(matches!(
            parse_param::<OrderStatus>(Some("lost".to_owned()), "status"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2026-03-20".to_owned()), "from").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 20)
        );
        assert!(parse_date(Some("20/03/2026".to_owned()), "from").is_err());
    }
}
