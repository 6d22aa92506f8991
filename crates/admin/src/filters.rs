//! Askama filters for the admin templates.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Year for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS modifier for an order status badge.
///
/// Usage in templates: `<span class="badge {{ order.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(status: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(status_class_for(&status.to_string()))
}

fn status_class_for(status: &str) -> &'static str {
    match status {
        "PENDING" => "badge-pending",
        "PROCESSING" => "badge-active",
        "SHIPPED" | "DELIVERED" => "badge-done",
        "CANCELLED" | "REFUNDED" => "badge-closed",
        _ => "",
    }
}

/// Human label for a stored notification kind: `"new_order"` -> `"New order"`.
///
/// Usage in templates: `{{ note.kind|kind_label }}`
#[askama::filter_fn]
pub fn kind_label(kind: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(kind_label_for(&kind.to_string()))
}

fn kind_label_for(kind: &str) -> String {
    let words = kind.replace('_', " ");
    let mut chars = words.chars();
    chars
        .next()
        .map_or_else(String::new, |c| c.to_uppercase().chain(chars).collect())
}
