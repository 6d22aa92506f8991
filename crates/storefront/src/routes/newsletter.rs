//! Newsletter subscription route handlers.
//!
//! Subscribing is idempotent: an address that is already on the list gets
//! the same success fragment. New (or returning) subscribers get a welcome
//! email when SMTP is configured.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use moonstone_core::Email;
use moonstone_db::SubscriberRepository;

use crate::filters;
use crate::state::AppState;

/// Default `source` recorded for a subscription.
const DEFAULT_SOURCE: &str = "footer";

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
    pub source: Option<String>,
}

/// Unsubscribe link query.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Unsubscribe confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/unsubscribed.html")]
pub struct UnsubscribedTemplate {
    pub email: Option<String>,
    pub found: bool,
}

/// Normalize the form's `source`, keeping it short and slug-like.
fn source_label(source: Option<&str>) -> String {
    source
        .map(moonstone_core::slugify)
        .filter(|s| !s.is_empty())
        .map_or_else(|| DEFAULT_SOURCE.to_string(), |s| s.chars().take(32).collect())
}

/// Subscribe to newsletter (HTMX).
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let Ok(email) = Email::parse(&form.email) else {
        return SubscribeErrorTemplate {
            message: "Please enter a valid email address.".to_string(),
            email: form.email.trim().to_string(),
        }
        .into_response();
    };

    let source = source_label(form.source.as_deref());
    match SubscriberRepository::new(state.pool())
        .subscribe(&email, &source)
        .await
    {
        Ok((_, newly_subscribed)) => {
            tracing::info!(email = %email, newly_subscribed, "Newsletter subscription");
            if newly_subscribed && let Some(mailer) = state.email() {
                if let Err(e) = mailer.send_newsletter_welcome(email.as_str()).await {
                    tracing::warn!(email = %email, error = %e, "Welcome email failed");
                }
            }
            SubscribeSuccessTemplate {
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(email = %email, error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: "Something went wrong. Please try again.".to_string(),
                email: email.into_inner(),
            }
            .into_response()
        }
    }
}

/// Unsubscribe from the link in a newsletter footer.
#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeQuery>,
) -> impl IntoResponse {
    let Some(email) = query.email.as_deref().and_then(|e| Email::parse(e).ok()) else {
        return UnsubscribedTemplate {
            email: query.email,
            found: false,
        };
    };

    let found = SubscriberRepository::new(state.pool())
        .unsubscribe(&email)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(email = %email, error = %e, "Unsubscribe failed");
            false
        });
    if found {
        tracing::info!(email = %email, "Unsubscribed");
    }

    UnsubscribedTemplate {
        email: Some(email.into_inner()),
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_label() {
        assert_eq!(source_label(None), "footer");
        assert_eq!(source_label(Some("  ")), "footer");
        assert_eq!(source_label(Some("Zodiac Quiz")), "zodiac-quiz");
        assert_eq!(source_label(Some(&"x".repeat(80))).len(), 32);
    }
}
