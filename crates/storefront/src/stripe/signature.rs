//! `Stripe-Signature` header verification.
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`. Each `v1` is an
//! HMAC-SHA256 of `"{t}.{raw body}"` keyed with the endpoint secret; any one
//! match is accepted (Stripe sends several while a secret is being rolled).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header Stripe signs webhook deliveries with.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted distance between the signed timestamp and now.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Signature verification failures. All of them map to HTTP 400.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header: {0}")]
    Malformed(&'static str),

    #[error("signature timestamp outside tolerance ({age}s)")]
    TimestampOutsideTolerance { age: i64 },

    #[error("no signature matches the payload")]
    NoMatch,
}

/// Parsed header contents.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::Malformed("invalid timestamp"))?,
                );
            }
            // Unparseable v1 entries are skipped; v0 and future schemes are ignored.
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed("no v1 signature"));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_payload_mac(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed("unusable signing secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verify a webhook delivery.
///
/// Returns the signed timestamp on success. `now` is the current unix time in
/// seconds.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the header is malformed, no `v1` signature
/// matches (compared in constant time), or the timestamp is more than
/// `tolerance_secs` away from `now`.
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<i64, SignatureError> {
    let parsed = parse_header(header)?;
    let mac = signed_payload_mac(payload, secret, parsed.timestamp)?;

    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(SignatureError::NoMatch);
    }

    let age = now - parsed.timestamp;
    if age.abs() > tolerance_secs {
        return Err(SignatureError::TimestampOutsideTolerance { age });
    }

    Ok(parsed.timestamp)
}

/// Build a `Stripe-Signature` header for a payload.
///
/// Used by the CLI and tests to produce deliveries the endpoint accepts.
///
/// # Errors
///
/// Returns [`SignatureError::Malformed`] if the secret cannot key an HMAC.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let mac = signed_payload_mac(payload, secret, timestamp)?;
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_Zx81mQp4Lr7Tn2Ka";
    const NOW: i64 = 1_760_000_000;
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_valid_signature() {
        let header = sign(BODY, SECRET, NOW).unwrap();
        assert_eq!(verify(BODY, &header, SECRET, NOW, 300), Ok(NOW));
    }

    #[test]
    fn test_tampered_body() {
        let header = sign(BODY, SECRET, NOW).unwrap();
        let result = verify(b"{\"id\":\"evt_2\"}", &header, SECRET, NOW, 300);
        assert_eq!(result, Err(SignatureError::NoMatch));
    }

    #[test]
    fn test_wrong_secret() {
        let header = sign(BODY, "whsec_other", NOW).unwrap();
        assert_eq!(
            verify(BODY, &header, SECRET, NOW, 300),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn test_stale_timestamp() {
        let header = sign(BODY, SECRET, NOW - 301).unwrap();
        assert_eq!(
            verify(BODY, &header, SECRET, NOW, 300),
            Err(SignatureError::TimestampOutsideTolerance { age: 301 })
        );
    }

    #[test]
    fn test_any_v1_may_match() {
        let good = sign(BODY, SECRET, NOW).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1={},v0=abc,v1={good_sig}", "00".repeat(32));
        assert!(verify(BODY, &header, SECRET, NOW, 300).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(
            verify(BODY, "v1=abcd", SECRET, NOW, 300),
            Err(SignatureError::Malformed("missing timestamp"))
        );
        assert_eq!(
            verify(BODY, "t=abc,v1=abcd", SECRET, NOW, 300),
            Err(SignatureError::Malformed("invalid timestamp"))
        );
        assert_eq!(
            verify(BODY, &format!("t={NOW}"), SECRET, NOW, 300),
            Err(SignatureError::Malformed("no v1 signature"))
        );
    }
}
