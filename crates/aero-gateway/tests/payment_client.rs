use aero_core::{
    BookingError, ContactRecord, Currency, Money, PaymentGateway, PaymentRequest, PaymentStatus,
};
use aero_gateway::webhook::compute_signature;
use aero_gateway::{HttpPaymentGateway, PaymentConfig, RetryPolicy};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "whsec_test";

fn gateway(server: &MockServer) -> HttpPaymentGateway {
    let config = PaymentConfig::new(server.uri(), "biz_key", SECRET)
        .with_public_base_url("https://aero.test")
        .with_retry(RetryPolicy::default().with_initial_backoff(Duration::from_millis(1)));
    HttpPaymentGateway::new(config)
}

fn request() -> PaymentRequest {
    PaymentRequest::new(
        Money::new(170.0, Currency::SGD),
        ContactRecord::new("Lim Shipping", "+6581234567", "ops@lim.sg"),
    )
}

#[tokio::test]
async fn test_create_payment_posts_form_and_returns_checkout_url() {
    let server = MockServer::start().await;
    let request = request();

    Mock::given(method("POST"))
        .and(path("/payment-requests"))
        .and(header("X-BUSINESS-API-KEY", "biz_key"))
        .and(body_string_contains("amount=170.00"))
        .and(body_string_contains("currency=SGD"))
        .and(body_string_contains(format!("reference_number={}", request.reference)))
        .and(body_string_contains("webhook=https%3A%2F%2Faero.test%2Fapi%2Fpayments%2Fwebhook"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "req_789",
            "status": "pending",
            "url": "https://pay.test/checkout/req_789"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let intent = gateway(&server).create_payment(&request).await.unwrap();

    assert_eq!(intent.id, "req_789");
    assert_eq!(intent.reference, request.reference);
    assert_eq!(intent.status, PaymentStatus::Pending);
    assert_eq!(intent.checkout_url.as_deref(), Some("https://pay.test/checkout/req_789"));
    assert!(!intent.simulated);
}

#[tokio::test]
async fn test_payment_status_maps_provider_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payment-requests/req_789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "req_789",
            "status": "completed"
        })))
        .mount(&server)
        .await;

    let status = gateway(&server).payment_status("req_789").await.unwrap();
    assert_eq!(status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_rejected_request_surfaces_gateway_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment-requests"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "The email is invalid"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).create_payment(&request()).await.unwrap_err();
    assert!(matches!(err, BookingError::Gateway { status: Some(422), .. }));
}

#[tokio::test]
async fn test_zero_amount_never_reaches_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let zero = PaymentRequest::new(Money::zero(Currency::SGD), ContactRecord::new("A", "1", "a@b.sg"));
    let err = gateway(&server).create_payment(&zero).await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_webhook_verified_with_configured_secret() {
    let server = MockServer::start().await;
    let gateway = gateway(&server);

    let fields: BTreeMap<String, String> = [
        ("payment_id", "pay_1"),
        ("payment_request_id", "req_789"),
        ("phone", "+6581234567"),
        ("amount", "170.00"),
        ("currency", "SGD"),
        ("status", "completed"),
        ("reference_number", "AERO-1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let signature = compute_signature(SECRET, &fields).unwrap();
    let body = serde_json::to_vec(&fields).unwrap();

    let payload = gateway.verify_webhook(&body, Some(&signature)).unwrap();
    assert_eq!(payload.reference_number, "AERO-1");
    assert_eq!(payload.payment_status(), PaymentStatus::Completed);

    let forged = compute_signature("not-the-secret", &fields).unwrap();
    assert!(matches!(
        gateway.verify_webhook(&body, Some(&forged)),
        Err(BookingError::WebhookVerificationFailed(_))
    ));
}
