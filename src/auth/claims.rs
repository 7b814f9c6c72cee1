//! Unverified expiry extraction for bearer tokens.
//!
//! The service issues JWT access tokens. The client reads the `exp` claim only
//! to schedule a proactive refresh. The signature is NOT checked, so nothing
//! returned from here may be used to make a trust decision. This module exposes
//! the expiry instant and nothing else.

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};

/// Read the `exp` claim of a JWT without verifying it.
///
/// Returns `None` for opaque (non-JWT) tokens, malformed payloads and tokens
/// without a numeric `exp`.
pub fn unverified_expiry(token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    // Some issuers keep the padding
    let payload_bytes = engine.decode(parts[1].trim_end_matches('=')).ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;

    let exp = payload.get("exp")?;
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_payload(payload: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = engine.encode(payload);
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_reads_exp_claim() {
        let token = jwt_with_payload(r#"{"sub":"client-1","exp":1700000000}"#);
        let exp = unverified_expiry(&token).unwrap();
        assert_eq!(exp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_fractional_exp() {
        let token = jwt_with_payload(r#"{"exp":1700000000.75}"#);
        assert_eq!(unverified_expiry(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_missing_exp() {
        let token = jwt_with_payload(r#"{"sub":"client-1"}"#);
        assert!(unverified_expiry(&token).is_none());
    }

    #[test]
    fn test_opaque_token() {
        assert!(unverified_expiry("opaque-bearer-value").is_none());
        assert!(unverified_expiry("a.b").is_none());
        assert!(unverified_expiry("a.!!!.c").is_none());
    }

    #[test]
    fn test_signature_is_ignored() {
        // Any signature segment is accepted: this is not a verification path
        let token = jwt_with_payload(r#"{"exp":4102444800}"#);
        let tampered = format!("{}tampered", token);
        assert_eq!(unverified_expiry(&tampered), unverified_expiry(&token));
    }
}
