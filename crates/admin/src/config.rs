//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//! - `STOREFRONT_BASE_URL` - Public storefront URL (links in campaigns and SEO report)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `CLAUDE_API_KEY` - Anthropic API key; blog generation uses templates without it
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `CLAUDE_API_URL` - Messages endpoint (default: <https://api.anthropic.com/v1/messages>)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` - Campaign mail;
//!   sending is disabled unless `SMTP_HOST` is set
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//! - `LOG_FORMAT` - `json` for structured logs, text otherwise

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;

pub use moonstone_core::env::{ConfigError, SmtpConfig, Telemetry};
use moonstone_core::env;

const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Public base URL of the storefront, no trailing slash
    pub storefront_url: String,
    pub session_secret: SecretString,
    /// Enables LLM blog generation
    pub claude: Option<ClaudeConfig>,
    /// Campaign mail, if configured
    pub email: Option<SmtpConfig>,
    pub telemetry: Telemetry,
}

/// Claude API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    pub api_key: SecretString,
    /// Model ID
    pub model: String,
    /// Messages endpoint, overridable for tests
    pub api_url: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AdminConfig {
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

        Ok(Self {
            database_url: env::database_url("ADMIN_DATABASE_URL")?,
            host: env::parse_or("ADMIN_HOST", "127.0.0.1")?,
            port: env::parse_or("ADMIN_PORT", "3001")?,
            base_url: env::required("ADMIN_BASE_URL")?,
            storefront_url: env::required("STOREFRONT_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            session_secret: env::session_secret("ADMIN_SESSION_SECRET")?,
            claude: ClaudeConfig::from_env()?,
            email: SmtpConfig::from_env()?,
            telemetry: Telemetry::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ClaudeConfig {
    /// Load Claude settings. Returns `None` when `CLAUDE_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if the key looks like a placeholder.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env::optional("CLAUDE_API_KEY") else {
            return Ok(None);
        };
        env::validate_secret_strength(&api_key, "CLAUDE_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: env::or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
            api_url: env::or_default("CLAUDE_API_URL", DEFAULT_CLAUDE_API_URL),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_config_debug_redacts_key() {
        let config = ClaudeConfig {
            api_key: SecretString::from("sk-ant-REDACTED"),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            api_url: DEFAULT_CLAUDE_API_URL.to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains(DEFAULT_CLAUDE_MODEL));
        assert!(!debug_output.contains("Qm7vXz2LpR9tKw4N"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            storefront_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            claude: None,
            email: None,
            telemetry: Telemetry::default(),
        };
        assert_eq!(config.socket_addr().port(), 3001);
    }
}
