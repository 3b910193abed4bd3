//! # Payment Webhook Handling
//!
//! Signature verification and dispatch for payment provider webhooks.
//!
//! The provider signs every field except `hmac`: fields are sorted by key,
//! concatenated as `key` + `value` with no separators, and signed with
//! HMAC-SHA256 using the shared webhook secret (hex encoded).

use aero_core::{BookingError, BookingResult, PaymentStatus, WebhookPayload};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_FIELD: &str = "hmac";

/// Sorted key+value concatenation of every field except the signature
pub fn signing_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE_FIELD)
        .map(|(key, value)| format!("{}{}", key, value))
        .collect()
}

/// Hex HMAC-SHA256 of the signing string
pub fn compute_signature(secret: &str, fields: &BTreeMap<String, String>) -> BookingResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BookingError::Internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(signing_string(fields).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Flatten a JSON webhook body into string fields
fn payload_fields(payload: &[u8]) -> BookingResult<BTreeMap<String, String>> {
    let object: serde_json::Map<String, Value> = serde_json::from_slice(payload)
        .map_err(|e| BookingError::WebhookParse(format!("Failed to parse webhook: {}", e)))?;

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// Verify a raw webhook body and parse it.
///
/// `signature` overrides the `hmac` field when the provider sends the
/// signature in a header.
pub fn verify_webhook_payload(
    secret: &str,
    payload: &[u8],
    signature: Option<&str>,
) -> BookingResult<WebhookPayload> {
    let fields = payload_fields(payload)?;

    let provided = signature
        .map(str::to_string)
        .or_else(|| fields.get(SIGNATURE_FIELD).cloned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BookingError::WebhookVerificationFailed("Missing signature".to_string()))?;

    let expected = compute_signature(secret, &fields)?;
    if !constant_time_compare(&provided.to_ascii_lowercase(), &expected) {
        return Err(BookingError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    let webhook: WebhookPayload = serde_json::from_slice(payload)
        .map_err(|e| BookingError::WebhookParse(format!("Unexpected webhook shape: {}", e)))?;
    debug!(reference = %webhook.reference_number, status = %webhook.status, "Verified payment webhook");
    Ok(webhook)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Webhook event handler trait
///
/// Implement this trait to react to payment status changes.
#[allow(unused_variables)]
pub trait WebhookHandler: Send + Sync {
    /// Called when a payment completes
    fn on_payment_completed(&self, payload: &WebhookPayload) -> BookingResult<()> {
        info!(reference = %payload.reference_number, amount = %payload.amount, "Payment completed");
        Ok(())
    }

    /// Called when a payment fails or expires
    fn on_payment_failed(&self, payload: &WebhookPayload) -> BookingResult<()> {
        warn!(reference = %payload.reference_number, status = %payload.status, "Payment failed");
        Ok(())
    }

    /// Called for statuses that are not final yet
    fn on_payment_pending(&self, payload: &WebhookPayload) -> BookingResult<()> {
        debug!(reference = %payload.reference_number, status = %payload.status, "Payment still pending");
        Ok(())
    }
}

/// Default handler that only logs
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a verified webhook to the matching handler method
pub fn dispatch_webhook_event(handler: &dyn WebhookHandler, payload: &WebhookPayload) -> BookingResult<()> {
    match payload.payment_status() {
        PaymentStatus::Completed => handler.on_payment_completed(payload),
        PaymentStatus::Failed => handler.on_payment_failed(payload),
        PaymentStatus::Pending => handler.on_payment_pending(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SECRET: &str = "whsec_aero_test";

    fn signed_body(status: &str) -> Vec<u8> {
        let mut body = json!({
            "payment_id": "pay_123",
            "payment_request_id": "req_456",
            "phone": "+6581234567",
            "amount": "170.00",
            "currency": "SGD",
            "status": status,
            "reference_number": "AERO-abc",
        });
        let fields = payload_fields(body.to_string().as_bytes()).unwrap();
        let hmac = compute_signature(SECRET, &fields).unwrap();
        body["hmac"] = Value::String(hmac);
        body.to_string().into_bytes()
    }

    #[test]
    fn test_signing_string_sorted_without_hmac() {
        let fields: BTreeMap<String, String> = [
            ("status", "completed"),
            ("amount", "170.00"),
            ("hmac", "ignored"),
            ("currency", "SGD"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(signing_string(&fields), "amount170.00currencySGDstatuscompleted");
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let fields = BTreeMap::from([("amount".to_string(), "1.00".to_string())]);
        let sig = compute_signature(SECRET, &fields).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_valid_webhook_accepted() {
        let payload = verify_webhook_payload(SECRET, &signed_body("completed"), None).unwrap();
        assert_eq!(payload.reference_number, "AERO-abc");
        assert_eq!(payload.payment_status(), PaymentStatus::Completed);
    }

    #[test]
    fn test_tampered_webhook_rejected() {
        let body = String::from_utf8(signed_body("completed")).unwrap().replace("170.00", "1.00");
        let result = verify_webhook_payload(SECRET, body.as_bytes(), None);
        assert!(matches!(result, Err(BookingError::WebhookVerificationFailed(_))));
    }

    #[test]
    fn test_wrong_secret_and_missing_signature_rejected() {
        assert!(verify_webhook_payload("other", &signed_body("completed"), None).is_err());
        let unsigned = json!({"payment_id": "p", "status": "completed"}).to_string();
        assert!(matches!(
            verify_webhook_payload(SECRET, unsigned.as_bytes(), None),
            Err(BookingError::WebhookVerificationFailed(_))
        ));
        assert!(matches!(
            verify_webhook_payload(SECRET, b"not json", None),
            Err(BookingError::WebhookParse(_))
        ));
    }

    #[test]
    fn test_header_signature_overrides_field() {
        let body = signed_body("completed");
        assert!(verify_webhook_payload(SECRET, &body, Some("00")).is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_dispatch_webhook() {
        struct FailedHandler {
            called: AtomicBool,
        }

        impl WebhookHandler for FailedHandler {
            fn on_payment_failed(&self, _payload: &WebhookPayload) -> BookingResult<()> {
                self.called.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let handler = FailedHandler {
            called: AtomicBool::new(false),
        };
        let payload = verify_webhook_payload(SECRET, &signed_body("failed"), None).unwrap();
        dispatch_webhook_event(&handler, &payload).unwrap();

        assert!(handler.called.load(Ordering::SeqCst));
    }
}
