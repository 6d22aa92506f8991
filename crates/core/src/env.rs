//! Environment parsing shared by the storefront and admin binaries.
//!
//! Each binary's `config` module describes its own variables; this module
//! owns the lookup helpers, the secret checks and the settings both
//! binaries read the same way (SMTP and telemetry).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Minimum length of a session secret.
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a value as a placeholder (matched case-insensitively).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// A variable that must be set.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if `key` is unset.
pub fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// A variable that may be unset; blank counts as unset.
#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `key`, or `default` when unset.
#[must_use]
pub fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse `key` (or `default` when unset) into `T`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Database URL from `primary_key`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// A required secret that passes [`validate_secret_strength`].
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing or looks weak.
pub fn validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// A session secret: strong and at least [`MIN_SESSION_SECRET_LENGTH`] long.
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing, short or weak.
pub fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = validated_secret(key)?;
    let length = secret.expose_secret().len();
    if length < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"),
        ));
    }
    Ok(secret)
}

/// Shannon entropy in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
///
/// Provider keys carry a fixed prefix (`sk_live_`, `whsec_`, `sk-ant-api03-`);
/// when the part after the last `_` or `-` is at least 12 characters only
/// that part is scored.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` describing the problem.
pub fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let random_part = secret
        .rsplit(['_', '-'])
        .next()
        .filter(|tail| tail.chars().count() >= 12)
        .unwrap_or(secret);
    let entropy = shannon_entropy(random_part);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Outgoing mail settings. `Debug` redacts the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// `From` header.
    pub from_address: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SmtpConfig {
    /// `SMTP_*` variables; `None` unless `SMTP_HOST` is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SMTP_HOST` is set but the credentials or
    /// sender are missing, or the port does not parse.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = optional("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_or("SMTP_PORT", "587")?,
            smtp_username: required("SMTP_USERNAME")?,
            smtp_password: SecretString::from(required("SMTP_PASSWORD")?),
            from_address: required("SMTP_FROM")?,
        }))
    }
}

/// Log format and Sentry settings.
#[derive(Debug, Clone)]
pub struct Telemetry {
    /// JSON log lines instead of text.
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    /// e.g. "development", "production"
    pub sentry_environment: Option<String>,
    /// Error sample rate, 0.0 to 1.0.
    pub sentry_sample_rate: f32,
    /// Performance traces sample rate, 0.0 to 1.0.
    pub sentry_traces_sample_rate: f32,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

impl Telemetry {
    /// `LOG_FORMAT` and `SENTRY_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a sample rate does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_json: optional("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}
