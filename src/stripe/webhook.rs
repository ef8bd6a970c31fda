use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::types::WebhookEvent;
use crate::utils::{AppError, AppResult};

/// Maximum age of a signed webhook before it is treated as a replay
pub const TOLERANCE_SECS: i64 = 300;

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
/// against the raw request body.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now: i64) -> AppResult<()> {
    if secret.is_empty() {
        return Err(AppError::Internal("Webhook secret is not configured".to_string()));
    }

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::InvalidRequest("Missing signature timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(AppError::InvalidRequest("Missing v1 signature".to_string()));
    }
    if now.abs_diff(timestamp) > TOLERANCE_SECS.unsigned_abs() {
        return Err(AppError::InvalidRequest("Signature timestamp outside tolerance".to_string()));
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    if signatures.iter().any(|sig| constant_time_compare(&expected, sig)) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest("Signature mismatch".to_string()))
    }
}

pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn parse_event(payload: &[u8]) -> AppResult<WebhookEvent> {
    serde_json::from_slice(payload)
        .map_err(|e| AppError::InvalidRequest(format!("Malformed webhook payload: {}", e)))
}

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
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;

    fn header_for(timestamp: i64, body: &[u8]) -> String {
        format!("t={},v1={}", timestamp, compute_signature(SECRET, timestamp, body).unwrap())
    }

    #[test]
    fn test_valid_signature() {
        let header = header_for(1_700_000_000, BODY);
        assert!(verify_signature(SECRET, &header, BODY, 1_700_000_030).is_ok());
    }

    #[test]
    fn test_any_matching_v1_accepted() {
        let good = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1={},v1={}", "0".repeat(64), good);
        assert!(verify_signature(SECRET, &header, BODY, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = header_for(1_700_000_000, BODY);
        let tampered = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_2"}}}"#;
        assert!(verify_signature(SECRET, &header, tampered, 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let header = header_for(1_700_000_000, BODY);
        let later = 1_700_000_000 + TOLERANCE_SECS + 1;
        assert!(verify_signature(SECRET, &header, BODY, later).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = header_for(1_700_000_000, BODY);
        assert!(verify_signature("whsec_other", &header, BODY, 1_700_000_000).is_err());
    }

    #[test]
    fn test_malformed_headers_rejected() {
        assert!(verify_signature(SECRET, "", BODY, 0).is_err());
        assert!(verify_signature(SECRET, "t=abc,v1=deadbeef", BODY, 0).is_err());
        assert!(verify_signature(SECRET, "t=1700000000", BODY, 1_700_000_000).is_err());
    }

    #[test]
    fn test_extreme_timestamps_are_stale() {
        let zeros = "0".repeat(64);
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1={}", t, zeros);
            let err = verify_signature(SECRET, &header, BODY, 1_700_000_000).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_unconfigured_secret_is_server_error() {
        let header = header_for(1_700_000_000, BODY);
        let err = verify_signature("", &header, BODY, 1_700_000_000).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_parse_event() {
        let event = parse_event(BODY).unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.data.object["id"], "pi_1");
    }
}
