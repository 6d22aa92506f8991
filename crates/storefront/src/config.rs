//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key (rendered into checkout)
//! - `STRIPE_WEBHOOK_SECRET` - Signing secret for `/api/webhooks/stripe`
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog snapshot lifetime (default: 300)
//! - `STRIPE_API_BASE` - Stripe API origin (default: <https://api.stripe.com>)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` - Outgoing mail;
//!   email is disabled unless `SMTP_HOST` is set
//! - `ADMIN_NOTIFICATION_EMAIL` - Copy of every order confirmation
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for structured logs, text otherwise

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;

pub use moonstone_core::env::{ConfigError, SmtpConfig, Telemetry};
use moonstone_core::env;

const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, no trailing slash
    pub base_url: String,
    pub session_secret: SecretString,
    pub stripe: StripeConfig,
    /// Outgoing mail, if configured
    pub email: Option<SmtpConfig>,
    /// Address that receives a copy of each order confirmation
    pub admin_notification_email: Option<String>,
    /// How long the catalog snapshot is cached
    pub catalog_cache_ttl: Duration,
    pub telemetry: Telemetry,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// Publishable key (safe to expose in browser)
    pub publishable_key: String,
    /// Webhook endpoint signing secret
    pub webhook_secret: SecretString,
    /// API base URL, overridable for tests
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let ttl_secs: u64 = env::parse_or(
            "CATALOG_CACHE_TTL_SECS",
            &DEFAULT_CATALOG_TTL_SECS.to_string(),
        )?;

        Ok(Self {
            database_url: env::database_url("STOREFRONT_DATABASE_URL")?,
            host: env::parse_or("STOREFRONT_HOST", "127.0.0.1")?,
            port: env::parse_or("STOREFRONT_PORT", "3000")?,
            base_url: env::required("STOREFRONT_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            session_secret: env::session_secret("STOREFRONT_SESSION_SECRET")?,
            stripe: StripeConfig::from_env()?,
            email: SmtpConfig::from_env()?,
            admin_notification_email: env::optional("ADMIN_NOTIFICATION_EMAIL"),
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            telemetry: Telemetry::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: env::validated_secret("STRIPE_SECRET_KEY")?,
            publishable_key: env::required("STRIPE_PUBLISHABLE_KEY")?,
            webhook_secret: env::validated_secret("STRIPE_WEBHOOK_SECRET")?,
            api_base: env::or_default("STRIPE_API_BASE", "https://api.stripe.com")
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stripe_config() -> StripeConfig {
        StripeConfig {
            secret_key: SecretString::from("sk_test_51Hq8ZpLk3vR9wXy"),
            publishable_key: "pk_test_visible".to_string(),
            webhook_secret: SecretString::from("whsec_Zx81mQp4Lr7Tn2Ka"),
            api_base: "https://api.stripe.com".to_string(),
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            stripe: stripe_config(),
            email: None,
            admin_notification_email: None,
            catalog_cache_ttl: Duration::from_secs(300),
            telemetry: Telemetry::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_stripe_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", stripe_config());

        assert!(debug_output.contains("pk_test_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_test_51Hq8ZpLk3vR9wXy"));
        assert!(!debug_output.contains("whsec_Zx81mQp4Lr7Tn2Ka"));
    }
}
