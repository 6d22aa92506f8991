//! Admin sign-in.
//!
//! Same email and password accounts as the storefront; only users with the
//! `admin` role get through.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthService, AuthError};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Query string code for a failed sign-in.
fn error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::NotAdmin => "not_admin",
        AuthError::Repository(_) => "unavailable",
        AuthError::InvalidEmail(_) | AuthError::InvalidCredentials => "credentials",
    }
}

fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "not_admin" => "This account does not have admin access.",
        "session" => "Could not start a session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "logged_out" => "Signed out.",
        _ => "Done.",
    }
}

/// Display the login page, or go straight to the dashboard when signed in.
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let admin = CurrentAdmin::from(&user);
            if let Err(e) = set_current_admin(&session, &admin).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/auth/login?error=session").into_response();
            }
            set_sentry_user(&admin.id, Some(admin.email.as_str()));
            tracing::info!(admin_id = %admin.id, "Admin signed in");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Admin login failed: {}", e);
            Redirect::to(&format!("/auth/login?error={}", error_code(&e))).into_response()
        }
    }
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/auth/login?success=logged_out").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip_to_messages() {
        assert_eq!(
            error_message(error_code(&AuthError::NotAdmin)),
            "This account does not have admin access."
        );
        assert_eq!(
            error_message(error_code(&AuthError::InvalidCredentials)),
            "Invalid email or password."
        );
        // Unknown email format is indistinguishable from a wrong password
        let invalid = AuthError::from(moonstone_core::Email::parse("nope").unwrap_err());
        assert_eq!(
            error_code(&invalid),
            error_code(&AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(error_message("bogus"), "Something went wrong. Please try again.");
        assert_eq!(success_message("bogus"), "Done.");
    }
}
