//! Webhook signature verification.
//!
//! Signed notifications carry three headers: a message id, a unix timestamp
//! and a space-separated list of `v1,<base64>` signatures. The signed content
//! is `"{id}.{timestamp}.{body}"`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::error::PaymentError;

/// Maximum clock skew accepted for a notification.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Prefix on secrets issued as base64 key material.
const SECRET_PREFIX: &str = "whsec_";

/// Verify a webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `id` - The `webhook-id` header value
/// * `timestamp` - The `webhook-timestamp` header value
/// * `body` - The raw request body
/// * `signatures` - The `webhook-signature` header value
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the timestamp is outside the
/// tolerance or no listed signature matches.
#[instrument(skip(secret, body, signatures))]
pub fn verify_webhook_signature(
    secret: &SecretString,
    id: &str,
    timestamp: &str,
    body: &str,
    signatures: &str,
) -> Result<(), PaymentError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("Invalid timestamp".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature(
            "Request timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign(secret, id, timestamp, body)?;

    let matched = signatures
        .split_whitespace()
        .filter_map(|entry| entry.strip_prefix("v1,"))
        .any(|candidate| constant_time_compare(&expected, candidate));

    if !matched {
        return Err(PaymentError::InvalidSignature(
            "Signature mismatch".to_string(),
        ));
    }

    debug!("Webhook signature verified");
    Ok(())
}

/// Compute the base64 signature for a message.
pub(crate) fn sign(
    secret: &SecretString,
    id: &str,
    timestamp: &str,
    body: &str,
) -> Result<String, PaymentError> {
    let key = secret_key(secret.expose_secret())?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key)
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(format!("{id}.{timestamp}.{body}").as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn secret_key(secret: &str) -> Result<Vec<u8>, PaymentError> {
    match secret.strip_prefix(SECRET_PREFIX) {
        Some(encoded) => STANDARD
            .decode(encoded)
            .map_err(|e| PaymentError::InvalidSignature(format!("Malformed secret: {e}"))),
        None => Ok(secret.as_bytes().to_vec()),
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"imp_uid":"imp_1","merchant_uid":"20260114-AB12CD34","status":"paid"}"#;

    fn secret() -> SecretString {
        SecretString::from("test-webhook-secret")
    }

    fn now() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    #[test]
    fn test_valid_signature() {
        let ts = now();
        let signature = sign(&secret(), "msg_1", &ts, BODY).unwrap();
        let header = format!("v1,{signature}");
        assert!(verify_webhook_signature(&secret(), "msg_1", &ts, BODY, &header).is_ok());
    }

    #[test]
    fn test_any_listed_signature_may_match() {
        let ts = now();
        let signature = sign(&secret(), "msg_1", &ts, BODY).unwrap();
        let header = format!("v1,bm90LXRoaXMtb25l v1,{signature}");
        assert!(verify_webhook_signature(&secret(), "msg_1", &ts, BODY, &header).is_ok());
    }

    #[test]
    fn test_prefixed_secret_is_base64_key() {
        let encoded = SecretString::from(format!("whsec_{}", STANDARD.encode(b"raw-key-bytes")));
        let raw = SecretString::from("raw-key-bytes");
        let ts = now();
        assert_eq!(
            sign(&encoded, "msg_1", &ts, BODY).unwrap(),
            sign(&raw, "msg_1", &ts, BODY).unwrap()
        );
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let ts = now();
        let signature = sign(&secret(), "msg_1", &ts, BODY).unwrap();
        let header = format!("v1,{signature}");
        let result = verify_webhook_signature(
            &secret(),
            "msg_1",
            &ts,
            &BODY.replace("paid", "cancelled"),
            &header,
        );
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_unversioned_signature_is_ignored() {
        let ts = now();
        let signature = sign(&secret(), "msg_1", &ts, BODY).unwrap();
        assert!(verify_webhook_signature(&secret(), "msg_1", &ts, BODY, &signature).is_err());
    }

    #[test]
    fn test_old_timestamp_is_rejected() {
        let ts = (chrono::Utc::now().timestamp() - 600).to_string();
        let signature = sign(&secret(), "msg_1", &ts, BODY).unwrap();
        let header = format!("v1,{signature}");
        assert!(verify_webhook_signature(&secret(), "msg_1", &ts, BODY, &header).is_err());
    }

    #[test]
    fn test_invalid_timestamp() {
        let result = verify_webhook_signature(&secret(), "msg_1", "yesterday", BODY, "v1,abc");
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
