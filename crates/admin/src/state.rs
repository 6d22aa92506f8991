//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::AdminConfig;
use crate::services::email::EmailService;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("claude client error: {0}")]
    Claude(#[from] ClaudeError),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    email: Option<EmailService>,
    claude: Option<ClaudeClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Claude client or the SMTP relay cannot be
    /// configured.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, StateError> {
        let email = config
            .email
            .as_ref()
            .map(|email| EmailService::new(email, &config.storefront_url))
            .transpose()?;
        if email.is_none() {
            tracing::warn!("SMTP not configured, campaigns cannot be sent");
        }

        let claude = config.claude.as_ref().map(ClaudeClient::new).transpose()?;
        if claude.is_none() {
            tracing::info!("CLAUDE_API_KEY not set, blog generation uses templates only");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                claude,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Campaign mailer, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Claude client, if an API key is configured.
    #[must_use]
    pub fn claude(&self) -> Option<&ClaudeClient> {
        self.inner.claude.as_ref()
    }
}
