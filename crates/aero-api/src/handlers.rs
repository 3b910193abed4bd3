//! # Request Handlers
//!
//! Axum request handlers for the booking API.
//! Each session endpoint locks its session, runs one orchestrator
//! transition and answers with the session snapshot.

use crate::state::AppState;
use aero_core::routes::CARGO_ROUTES;
use aero_core::{
    validate_cargo_route, BookingError, BookingSession, CargoBookingOrchestrator, CargoDetails,
    CargoFeeCalculator, CargoFees, CargoQuoteRequest, CargoSearch, CargoSession, CargoStep,
    CargoSummary, ContactRecord, Currency, FareCalculator, FlightBookingOrchestrator,
    PassengerCounts, PassengerRecord, PaymentIntent, PaymentStatus, SearchCriteria,
};
use aero_gateway::poller::DEFAULT_MAX_POLLS;
use aero_gateway::{dispatch_webhook_event, PaymentPoller};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Header carrying the webhook signature when the provider does not put
/// it in the payload
pub const SIGNATURE_HEADER: &str = "x-signature";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn booking_error_to_response(err: BookingError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code).with_details(err.kind().as_str());
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSessionResponse {
    pub session_id: Uuid,
    pub step: u8,
    pub step_name: &'static str,
    pub degraded: bool,
    pub session: BookingSession,
}

impl FlightSessionResponse {
    fn new(session_id: Uuid, booking: &FlightBookingOrchestrator) -> Self {
        Self {
            session_id,
            step: booking.step().number(),
            step_name: booking.step().as_str(),
            degraded: booking.session().is_degraded(),
            session: booking.session().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoSessionResponse {
    pub session_id: Uuid,
    pub step: u8,
    pub step_name: &'static str,
    pub session: CargoSession,
}

impl CargoSessionResponse {
    fn new(session_id: Uuid, booking: &CargoBookingOrchestrator) -> Self {
        Self {
            session_id,
            step: booking.step().number(),
            step_name: booking.step().as_str(),
            session: booking.session().clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuoteRequest {
    pub adult_price: f64,
    #[serde(default)]
    pub currency: Currency,
    pub passengers: PassengerCounts,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectFlightRequest {
    pub flight_id: String,
    #[serde(default)]
    pub is_return: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDateRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_return: bool,
}

#[derive(Debug, Deserialize)]
pub struct PassengersRequest {
    pub passengers: Vec<PassengerRecord>,
    pub contact: ContactRecord,
}

#[derive(Debug, Deserialize)]
pub struct ContactsRequest {
    pub shipper: ContactRecord,
    pub consignee: ContactRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSummaryRequest {
    #[serde(default)]
    pub rate_override: Option<CargoFees>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Defaults to the shipper
    #[serde(default)]
    pub payer: Option<ContactRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: Uuid,
    pub payment: PaymentIntent,
}

// =============================================================================
// Health & quotes
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.providers().await;
    let status = if providers.iter().all(|p| p.available) {
        "healthy"
    } else {
        "degraded"
    };

    Json(serde_json::json!({
        "status": status,
        "service": "aero-booking",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "providers": providers,
    }))
}

/// Price a fare without a session
pub async fn quote_fare(Json(request): Json<FareQuoteRequest>) -> Result<impl IntoResponse, ApiError> {
    let breakdown = FareCalculator::calculate(request.adult_price, request.currency, &request.passengers)
        .map_err(booking_error_to_response)?;
    Ok(Json(breakdown))
}

/// Price a shipment without a session, using the current settings when reachable
#[instrument(skip(state, request), fields(origin = %request.origin, destination = %request.destination))]
pub async fn quote_cargo(
    State(state): State<AppState>,
    Json(request): Json<CargoQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_cargo_route(&request.origin, &request.destination).map_err(booking_error_to_response)?;
    if let Some(rates) = &request.rate_override {
        rates.validate().map_err(booking_error_to_response)?;
    }
    for package in &request.packages {
        package.validate().map_err(booking_error_to_response)?;
    }

    let settings = match state.settings.load().await {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(error = %e, "Cargo settings unavailable, quoting with fallback schedule");
            None
        }
    };

    Ok(Json(CargoFeeCalculator::quote(&request, settings.as_ref())))
}

/// The cargo route table
pub async fn list_cargo_routes() -> impl IntoResponse {
    Json(serde_json::json!({
        "routes": CARGO_ROUTES,
        "count": CARGO_ROUTES.len()
    }))
}

pub async fn check_cargo_route(Query(query): Query<RouteQuery>) -> Result<impl IntoResponse, ApiError> {
    let route = validate_cargo_route(&query.origin, &query.destination).map_err(booking_error_to_response)?;
    Ok(Json(route))
}

// =============================================================================
// Flight sessions
// =============================================================================

pub async fn create_flight_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, session) = state.flights.insert(state.new_flight_booking()).await;
    let booking = session.lock().await;
    info!(session_id = %id, "Flight session created");
    (StatusCode::CREATED, Json(FlightSessionResponse::new(id, &booking)))
}

pub async fn get_flight_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let booking = session.lock().await;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

pub async fn delete_flight_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.flights.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(booking_error_to_response(BookingError::SessionNotFound {
            session_id: id.to_string(),
        }))
    }
}

#[instrument(skip(state, criteria))]
pub async fn search_flights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(criteria): Json<SearchCriteria>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.search(criteria).await.map_err(booking_error_to_response)?;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

#[instrument(skip(state, request), fields(flight_id = %request.flight_id, is_return = request.is_return))]
pub async fn select_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectFlightRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;

    let candidates = if request.is_return {
        &booking.session().return_candidates
    } else {
        &booking.session().outbound_candidates
    };
    let flight = candidates
        .iter()
        .find(|f| f.id == request.flight_id)
        .cloned()
        .ok_or_else(|| {
            booking_error_to_response(BookingError::Validation(format!(
                "Flight {} is not among the search results",
                request.flight_id
            )))
        })?;

    booking
        .select_flight(&flight, request.is_return)
        .map_err(booking_error_to_response)?;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

pub async fn change_flight_date(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeDateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking
        .change_date(request.date, request.is_return)
        .await
        .map_err(booking_error_to_response)?;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

#[instrument(skip(state, request), fields(passengers = request.passengers.len()))]
pub async fn submit_passengers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PassengersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking
        .submit_passengers(request.passengers, request.contact)
        .await
        .map_err(booking_error_to_response)?;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

#[instrument(skip(state))]
pub async fn process_flight_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.process_payment().await.map_err(booking_error_to_response)?;
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

pub async fn flight_go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.go_back();
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

pub async fn flight_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.reset();
    Ok(Json(FlightSessionResponse::new(id, &booking)))
}

/// Close a confirmed booking; the session id is released afterwards
pub async fn flight_acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.flights.get(id).await.map_err(booking_error_to_response)?;
    let response = {
        let mut booking = session.lock().await;
        booking.acknowledge().map_err(booking_error_to_response)?;
        FlightSessionResponse::new(id, &booking)
    };
    state.flights.remove(id).await;
    info!(session_id = %id, "Flight session closed");
    Ok(Json(response))
}

// =============================================================================
// Cargo sessions
// =============================================================================

pub async fn create_cargo_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, session) = state.cargo.insert(state.new_cargo_booking()).await;
    let booking = session.lock().await;
    info!(session_id = %id, "Cargo session created");
    (StatusCode::CREATED, Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn get_cargo_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let booking = session.lock().await;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn delete_cargo_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.close_cargo_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(booking_error_to_response(BookingError::SessionNotFound {
            session_id: id.to_string(),
        }))
    }
}

pub async fn search_cargo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(search): Json<CargoSearch>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.search(search).map_err(booking_error_to_response)?;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn submit_cargo_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(details): Json<CargoDetails>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.submit_cargo_details(details).map_err(booking_error_to_response)?;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn submit_cargo_contacts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ContactsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking
        .submit_contacts(request.shipper, request.consignee)
        .map_err(booking_error_to_response)?;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

/// Price the shipment; the session stays on the summary step
pub async fn prepare_cargo_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PrepareSummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    let summary = booking
        .prepare_summary(request.rate_override)
        .await
        .map_err(booking_error_to_response)?;
    Ok(Json(summary))
}

pub async fn submit_cargo_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(summary): Json<CargoSummary>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.submit_summary(summary).map_err(booking_error_to_response)?;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

#[instrument(skip(state, request))]
pub async fn start_cargo_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;

    let payer = request
        .payer
        .or_else(|| booking.session().shipper.clone())
        .ok_or_else(|| booking_error_to_response(BookingError::Validation("A payer is required".to_string())))?;

    let intent = booking.start_checkout(payer).await.map_err(booking_error_to_response)?;
    state.track_payment(&intent.reference, id).await;
    watch_payment(&state, id, &intent);

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            session_id: id,
            payment: intent,
        }),
    ))
}

/// Poll the provider in the background until the payment settles
fn watch_payment(state: &AppState, session_id: Uuid, intent: &PaymentIntent) {
    let Some(interval) = state.config.payment_poll_interval else {
        return;
    };
    if intent.status.is_terminal() {
        return;
    }

    let mut poller = PaymentPoller::spawn(state.payments.clone(), intent.id.clone(), interval, DEFAULT_MAX_POLLS);
    let state = state.clone();
    let reference = intent.reference.clone();

    tokio::spawn(async move {
        let status = poller.wait().await;
        if status.is_terminal() {
            apply_payment_update(&state, session_id, &reference, status).await;
        }
    });
}

/// Apply a settled status to the cargo session that owns `reference`.
/// Returns false when the session is gone or no longer at checkout.
async fn apply_payment_update(state: &AppState, session_id: Uuid, reference: &str, status: PaymentStatus) -> bool {
    let Ok(session) = state.cargo.get(session_id).await else {
        warn!(%session_id, reference, "Payment update for a closed session");
        return false;
    };
    let mut booking = session.lock().await;

    if booking.step() != CargoStep::Checkout || booking.session().payment_reference() != Some(reference) {
        info!(%session_id, reference, step = %booking.step(), "Payment update not applicable");
        return false;
    }
    booking.apply_payment_status(reference, status).is_ok()
}

pub async fn refresh_cargo_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.refresh_payment_status().await.map_err(booking_error_to_response)?;
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

/// Confirm a paid shipment. The confirmation is returned once and the
/// session is closed.
pub async fn submit_cargo_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let response = {
        let mut booking = session.lock().await;
        booking.submit_payment().map_err(booking_error_to_response)?;
        CargoSessionResponse::new(id, &booking)
    };
    state.close_cargo_session(id).await;
    info!(session_id = %id, "Cargo session closed");
    Ok(Json(response))
}

pub async fn cargo_go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.go_back();
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn cargo_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.reset();
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

pub async fn reload_cargo_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.cargo.get(id).await.map_err(booking_error_to_response)?;
    let mut booking = session.lock().await;
    booking.reload_settings();
    Ok(Json(CargoSessionResponse::new(id, &booking)))
}

// =============================================================================
// Payment webhook & redirect pages
// =============================================================================

/// Handle a payment provider webhook
#[instrument(skip(state, headers, body))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let payload = state.payments.verify_webhook(&body, signature).map_err(|e| {
        error!("Webhook verification failed: {}", e);
        booking_error_to_response(e)
    })?;

    info!(
        reference = %payload.reference_number,
        status = %payload.status,
        "Received payment webhook"
    );

    dispatch_webhook_event(state.webhook_handler.as_ref(), &payload).map_err(|e| {
        error!("Webhook handler error: {}", e);
        booking_error_to_response(e)
    })?;

    let applied = match state.session_for_payment(&payload.reference_number).await {
        Some(session_id) => {
            apply_payment_update(&state, session_id, &payload.reference_number, payload.payment_status()).await
        }
        None => {
            warn!(reference = %payload.reference_number, "Webhook for an unknown payment reference");
            false
        }
    };

    Ok(Json(serde_json::json!({
        "received": true,
        "applied": applied
    })))
}

/// Landing page after the hosted checkout
pub async fn payment_complete(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let reference = params
        .get("reference")
        .or_else(|| params.get("reference_number"))
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Payment received</title></head>
<body style="font-family: system-ui; text-align: center; padding: 60px;">
    <h1>Payment received</h1>
    <p>Reference: <code>{}</code></p>
    <p>Return to the booking window to confirm your shipment.</p>
</body>
</html>
"#,
        html_escape(reference)
    ))
}

pub async fn payment_cancel() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Payment cancelled</title></head>
<body style="font-family: system-ui; text-align: center; padding: 60px;">
    <h1>Payment cancelled</h1>
    <p>No charges were made. You can start checkout again from the booking window.</p>
</body>
</html>
"#,
    )
}

fn html_escape(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("validation");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("validation"));
    }

    #[test]
    fn test_booking_error_conversion() {
        let (status, Json(body)) = booking_error_to_response(BookingError::Route("SIN to SIN".to_string()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.details.as_deref(), Some("route"));

        let (status, _) = booking_error_to_response(BookingError::InvalidStep {
            operation: "search",
            expected: 1,
            actual: 3,
        });
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a&\"b>"), "&lt;a&amp;&quot;b&gt;");
    }
}
