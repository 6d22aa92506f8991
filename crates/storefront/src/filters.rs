//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a 1-5 rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let filled = rating.to_string().parse::<usize>().unwrap_or(0).min(5);
    Ok(format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)))
}

/// Capitalizes a lowercase identifier such as a category or chakra.
///
/// Usage in templates: `{{ crystal.category|titleize }}`
#[askama::filter_fn]
pub fn titleize(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(titleize_str(&value.to_string()))
}

/// `"rose-quartz"` -> `"Rose Quartz"`.
#[must_use]
pub fn titleize_str(value: &str) -> String {
    value
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |c| {
                c.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titleize_str() {
        assert_eq!(titleize_str("rose-quartz"), "Rose Quartz");
        assert_eq!(titleize_str("third_eye"), "Third Eye");
        assert_eq!(titleize_str(""), "");
    }
}
