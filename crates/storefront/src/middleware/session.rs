//! Cookie sessions stored in `shop.session`.
//!
//! Anonymous visitors get a session too, since the cart lives there. A cart
//! left alone for two weeks expires with its session.

use std::time::Duration;

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration as CookieDuration;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ms_session";

/// Days of inactivity before a session (and its cart) expires.
pub const SESSION_IDLE_DAYS: i64 = 14;

/// How often expired rows are deleted.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Store over `shop.session`, created by the initial migration.
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
        .with_table_name("session")
        .expect("valid table name")
}

/// Session layer: `Lax` so links from emails keep the visitor signed in,
/// `Secure` whenever the public URL is HTTPS.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(CookieDuration::days(SESSION_IDLE_DAYS)))
        .with_secure(is_https(&config.base_url))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Delete expired sessions every `every` until the process exits.
pub async fn prune_expired_sessions(store: PostgresStore, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        if let Err(e) = store.delete_expired().await {
            tracing::warn!(error = %e, "Failed to delete expired sessions");
        }
    }
}

/// Whether cookies should carry the `Secure` attribute.
#[must_use]
pub fn is_https(base_url: &str) -> bool {
    base_url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_https() {
        assert!(is_https("https://moonstone.shop"));
        assert!(is_https("HTTPS://moonstone.shop"));
        assert!(!is_https("http://localhost:3000"));
        assert!(!is_https("https"));
    }
}
