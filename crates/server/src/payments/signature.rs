//! Stripe webhook signature verification.
//!
//! Header format: `Stripe-Signature: t=<unix seconds>,v1=<hex>[,v1=<hex>...]`.
//! The signed payload is `"<t>." ++ <raw body bytes>`, HMAC-SHA256 keyed with
//! the endpoint secret. Verification must see the body exactly as received;
//! re-serialized JSON will not match.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature header.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Reasons a webhook signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature header, or no secret configured to check it against.
    #[error("missing signature")]
    Missing,

    /// The header could not be parsed.
    #[error("malformed signature header: {0}")]
    Malformed(&'static str),

    /// No `v1` signature matched the payload.
    #[error("signature mismatch")]
    Mismatch,

    /// The signed timestamp is outside the tolerance window.
    #[error("signature timestamp outside tolerance")]
    Expired,
}

/// Verifies webhook signatures for one endpoint secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<SecretString>,
    tolerance: Duration,
}

impl WebhookVerifier {
    #[must_use]
    pub const fn new(secret: Option<SecretString>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Verify `payload` against a `Stripe-Signature` header value.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::Missing` when there is no header or no secret,
    /// `Malformed` for unparseable headers, `Mismatch` when no `v1` entry
    /// matches, and `Expired` when the timestamp is too far from `now`.
    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let secret = self.secret.as_ref().ok_or(SignatureError::Missing)?;
        let header = header.ok_or(SignatureError::Missing)?;
        let parsed = ParsedHeader::parse(header)?;

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::Malformed("unusable secret"))?;
        mac.update(parsed.timestamp_raw.as_bytes());
        mac.update(b".");
        mac.update(payload);

        // `verify_slice` compares in constant time.
        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        let age = now.timestamp().abs_diff(parsed.timestamp);
        if age > self.tolerance.as_secs() {
            return Err(SignatureError::Expired);
        }

        debug!("Webhook signature verified");
        Ok(())
    }
}

struct ParsedHeader<'a> {
    timestamp: i64,
    timestamp_raw: &'a str,
    signatures: Vec<Vec<u8>>,
}

impl<'a> ParsedHeader<'a> {
    fn parse(header: &'a str) -> Result<Self, SignatureError> {
        let mut timestamp_raw = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(SignatureError::Malformed("expected key=value pairs"));
            };
            match key {
                "t" => timestamp_raw = Some(value),
                // Non-hex entries can never match.
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp_raw = timestamp_raw.ok_or(SignatureError::Malformed("missing timestamp"))?;
        let timestamp = timestamp_raw
            .parse::<i64>()
            .map_err(|_| SignatureError::Malformed("invalid timestamp"))?;
        if signatures.is_empty() {
            return Err(SignatureError::Malformed("no v1 signature"));
        }

        Ok(Self {
            timestamp,
            timestamp_raw,
            signatures,
        })
    }
}

/// Build a `Stripe-Signature` header value for `payload` at `timestamp`.
///
/// Used by tests and local tooling that replay events.
#[must_use]
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return format!("t={timestamp}");
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Some(SecretString::from(SECRET)), Duration::from_secs(300))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = sign_payload(SECRET, payload, now().timestamp());
        assert_eq!(verifier().verify(payload, Some(&header), now()), Ok(()));
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let payload = b"{}";
        let good = sign_payload(SECRET, payload, now().timestamp());
        let v1 = good.split_once(",v1=").unwrap().1;
        let header = format!("t={},v1=deadbeef,v1={v1}", now().timestamp());
        assert_eq!(verifier().verify(payload, Some(&header), now()), Ok(()));
    }

    #[test]
    fn test_modified_payload_is_rejected() {
        let header = sign_payload(SECRET, br#"{"amount":100}"#, now().timestamp());
        assert_eq!(
            verifier().verify(br#"{"amount": 100}"#, Some(&header), now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let payload = b"{}";
        let header = sign_payload("whsec_other", payload, now().timestamp());
        assert_eq!(
            verifier().verify(payload, Some(&header), now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_old_timestamp_is_rejected() {
        let payload = b"{}";
        let header = sign_payload(SECRET, payload, now().timestamp() - 600);
        assert_eq!(
            verifier().verify(payload, Some(&header), now()),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_missing_header_or_secret() {
        assert_eq!(
            verifier().verify(b"{}", None, now()),
            Err(SignatureError::Missing)
        );

        let unconfigured = WebhookVerifier::new(None, Duration::from_secs(300));
        let header = sign_payload(SECRET, b"{}", now().timestamp());
        assert_eq!(
            unconfigured.verify(b"{}", Some(&header), now()),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_malformed_headers() {
        let v = verifier();
        assert!(matches!(
            v.verify(b"{}", Some("garbage"), now()),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            v.verify(b"{}", Some("v1=abcd"), now()),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            v.verify(b"{}", Some("t=1234567890"), now()),
            Err(SignatureError::Malformed(_))
        ));
        assert!(matches!(
            v.verify(b"{}", Some("t=soon,v1=abcd"), now()),
            Err(SignatureError::Malformed(_))
        ));
    }
}
