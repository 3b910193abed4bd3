use aero_core::memory::sample_flight;
use aero_core::{BookingError, PassengerCounts, SearchCriteria, SearchResults, TicketingGateway};
use aero_gateway::{HttpTicketingGateway, RetryPolicy, TicketingConfig};
use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpTicketingGateway {
    let config = TicketingConfig::new(server.uri(), "tk_test")
        .with_retry(RetryPolicy::default().with_initial_backoff(Duration::from_millis(1)));
    HttpTicketingGateway::new(config)
}

fn criteria() -> SearchCriteria {
    SearchCriteria::one_way(
        "DIL",
        "SIN",
        NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(),
        PassengerCounts::default(),
    )
}

fn results() -> SearchResults {
    SearchResults {
        outbound_flights: vec![sample_flight(
            "a1",
            "DIL",
            "SIN",
            NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(),
            320.0,
        )],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_search_sends_bearer_key_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("Authorization", "Bearer tk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results()))
        .expect(1)
        .mount(&server)
        .await;

    let found = gateway(&server).search(&criteria()).await.unwrap();

    assert_eq!(found.outbound_flights.len(), 1);
    assert_eq!(found.outbound_flights[0].economy.price, 320.0);
    assert!(!found.is_degraded());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results()))
        .expect(1)
        .mount(&server)
        .await;

    let found = gateway(&server).search(&criteria()).await.unwrap();
    assert_eq!(found.outbound_flights[0].id, "a1");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Unknown airport"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).search(&criteria()).await.unwrap_err();

    match err {
        BookingError::Gateway { status, message, .. } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Unknown airport");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = gateway(&server).search(&criteria()).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_a_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pnr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let request = aero_core::PnrRequest::new(
        &[],
        &aero_core::ContactRecord::new("Ana", "+6701234", "ana@aero.tl"),
        &results().outbound_flights[0],
        None,
    );
    let err = gateway(&server).generate_pnr(&request).await.unwrap_err();
    assert!(matches!(err, BookingError::Serialization(_)));
}

#[tokio::test]
async fn test_ticket_issuance_posts_booking_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tickets"))
        .and(body_json(json!({"bookingCode": "PNR001"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "passengers": [{"name": "Ana Soares", "ticketNumber": "PNR001-01"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issuance = gateway(&server).issue_ticket("PNR001").await.unwrap();

    assert!(issuance.success);
    assert_eq!(issuance.passengers[0].ticket_number, "PNR001-01");
}
