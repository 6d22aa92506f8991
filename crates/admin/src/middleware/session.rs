//! Admin sessions in `shop.admin_session`.
//!
//! Separate cookie and table from the storefront so a customer session can
//! never be read as an admin one. `SameSite=Strict` and a one day idle
//! timeout.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration as CookieDuration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "ms_admin_session";

/// Hours of inactivity before an admin is signed out.
pub const SESSION_IDLE_HOURS: i64 = 24;

/// Store over `shop.admin_session`.
///
/// # Panics
///
/// Panics if the schema or table name is rejected, which only happens for
/// names that are not plain identifiers.
#[must_use]
pub fn session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
        .with_schema_name("shop")
        .expect("valid schema name")
        .with_table_name("admin_session")
        .expect("valid table name")
}

/// Session layer for the admin binary.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(CookieDuration::hours(
            SESSION_IDLE_HOURS,
        )))
        .with_secure(config.base_url.to_ascii_lowercase().starts_with("https://"))
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
