//! # Routes
//!
//! Axum router configuration for the booking API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Quotes:
///   - POST /api/v1/quotes/fare - Fare breakdown for an adult price
///   - POST /api/v1/quotes/cargo - Cargo quote with the current settings
///   - GET  /api/v1/cargo/routes - Cargo route table
///   - GET  /api/v1/cargo/routes/check?origin=&destination= - Route lookup
///
/// - Flight sessions (`/api/v1/flights/sessions`):
///   - POST / - Create, GET|DELETE /{id}
///   - POST /{id}/search, /select, /change-date, /passengers, /payment
///   - POST /{id}/back, /reset, /acknowledge
///
/// - Cargo sessions (`/api/v1/cargo/sessions`):
///   - POST / - Create, GET|DELETE /{id}
///   - POST /{id}/search, /details, /contacts, /summary/prepare, /summary
///   - POST /{id}/checkout, /payment/refresh, /payment
///   - POST /{id}/back, /reset, /settings/reload
///
/// - Payments:
///   - POST /api/payments/webhook - Provider webhook
///   - GET  /cargo/payment/complete, /cargo/payment/cancel - Redirect pages
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let flight_routes = Router::new()
        .route("/", post(handlers::create_flight_session))
        .route(
            "/{id}",
            get(handlers::get_flight_session).delete(handlers::delete_flight_session),
        )
        .route("/{id}/search", post(handlers::search_flights))
        .route("/{id}/select", post(handlers::select_flight))
        .route("/{id}/change-date", post(handlers::change_flight_date))
        .route("/{id}/passengers", post(handlers::submit_passengers))
        .route("/{id}/payment", post(handlers::process_flight_payment))
        .route("/{id}/back", post(handlers::flight_go_back))
        .route("/{id}/reset", post(handlers::flight_reset))
        .route("/{id}/acknowledge", post(handlers::flight_acknowledge));

    let cargo_routes = Router::new()
        .route("/", post(handlers::create_cargo_session))
        .route(
            "/{id}",
            get(handlers::get_cargo_session).delete(handlers::delete_cargo_session),
        )
        .route("/{id}/search", post(handlers::search_cargo))
        .route("/{id}/details", post(handlers::submit_cargo_details))
        .route("/{id}/contacts", post(handlers::submit_cargo_contacts))
        .route("/{id}/summary/prepare", post(handlers::prepare_cargo_summary))
        .route("/{id}/summary", post(handlers::submit_cargo_summary))
        .route("/{id}/checkout", post(handlers::start_cargo_checkout))
        .route("/{id}/payment/refresh", post(handlers::refresh_cargo_payment))
        .route("/{id}/payment", post(handlers::submit_cargo_payment))
        .route("/{id}/back", post(handlers::cargo_go_back))
        .route("/{id}/reset", post(handlers::cargo_reset))
        .route("/{id}/settings/reload", post(handlers::reload_cargo_settings));

    let api_routes = Router::new()
        .route("/quotes/fare", post(handlers::quote_fare))
        .route("/quotes/cargo", post(handlers::quote_cargo))
        .route("/cargo/routes", get(handlers::list_cargo_routes))
        .route("/cargo/routes/check", get(handlers::check_cargo_route))
        .nest("/flights/sessions", flight_routes)
        .nest("/cargo/sessions", cargo_routes);

    // Webhook body must stay raw for signature verification
    let payment_routes = Router::new().route("/webhook", post(handlers::payment_webhook));

    let payment_pages = Router::new()
        .route("/complete", get(handlers::payment_complete))
        .route("/cancel", get(handlers::payment_cancel));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/api/payments", payment_routes)
        .nest("/cargo/payment", payment_pages)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use aero_core::memory::{InMemoryPaymentGateway, InMemorySettingsProvider, InMemoryTicketingGateway};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(AppState::new(
            AppConfig::local(),
            Arc::new(InMemoryTicketingGateway::default()),
            Arc::new(InMemoryPaymentGateway::new()),
            Arc::new(InMemorySettingsProvider::unavailable()),
        ))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_payment_pages() {
        for uri in ["/cargo/payment/complete?reference=AERO-1", "/cargo/payment/cancel"] {
            let response = router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_invalid_session_id_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/cargo/sessions/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
