//! Errors from the Claude Messages API client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Why a completion could not be produced.
#[derive(Debug, Error)]
pub enum ClaudeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the API's error type and message.
    #[error("API error ({kind}): {message}")]
    Api { kind: String, message: String },

    /// 429; seconds from `Retry-After`.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API key rejected")]
    InvalidCredentials,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("empty response")]
    EmptyResponse,

    /// Stopped at `max_tokens`.
    #[error("response truncated at {0} output tokens")]
    Truncated(u32),

    /// The reply did not start with a `# Title` line followed by a body.
    #[error("reply has no `# Title` line and body")]
    MissingTitle,

    /// The API key cannot be sent as a header.
    #[error("invalid API key header")]
    InvalidApiKey,
}

/// Seconds to report when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// `{"type":"error","error":{"type":..,"message":..}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl ClaudeError {
    /// Classify a non-success response from its status, `Retry-After`
    /// header value and body.
    #[must_use]
    pub fn from_response(status: StatusCode, retry_after: Option<&str>, body: &str) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(
                retry_after
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            ),
            StatusCode::UNAUTHORIZED => Self::InvalidCredentials,
            _ => match serde_json::from_str::<ErrorEnvelope>(body) {
                Ok(envelope) => Self::Api {
                    kind: envelope.error.kind,
                    message: envelope.error.message,
                },
                Err(_) => Self::Api {
                    kind: format!("http_{}", status.as_u16()),
                    message: body.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_uses_retry_after() {
        let err = ClaudeError::from_response(StatusCode::TOO_MANY_REQUESTS, Some("12"), "");
        assert!(matches!(err, ClaudeError::RateLimited(12)));

        let err = ClaudeError::from_response(StatusCode::TOO_MANY_REQUESTS, Some("soon"), "");
        assert!(matches!(err, ClaudeError::RateLimited(DEFAULT_RETRY_AFTER_SECS)));
    }

    #[test]
    fn test_unauthorized() {
        let err = ClaudeError::from_response(StatusCode::UNAUTHORIZED, None, "{}");
        assert!(matches!(err, ClaudeError::InvalidCredentials));
    }

    #[test]
    fn test_api_error_body_is_parsed() {
        let body = r#"{
            "type": "error",
            "error": {
                "type": "overloaded_error",
                "message": "Overloaded"
            }
        }"#;
        let err = ClaudeError::from_response(StatusCode::from_u16(529).unwrap_or_default(), None, body);
        assert_eq!(err.to_string(), "API error (overloaded_error): Overloaded");
    }

    #[test]
    fn test_unparseable_body_keeps_status() {
        let err = ClaudeError::from_response(StatusCode::BAD_GATEWAY, None, "upstream down");
        assert_eq!(err.to_string(), "API error (http_502): upstream down");
    }
}
