//! # Degraded Mode
//!
//! Wrappers that keep the booking flow usable when a provider is down.
//!
//! - `FallbackTicketingGateway` answers a failed search with one
//!   deterministic mock flight and flags the result as degraded. PNR and
//!   ticketing failures are passed through untouched.
//! - `FallbackPaymentGateway` answers a failed payment creation with a
//!   simulated completed payment after a fixed delay, unless simulation is
//!   disabled (production).

use aero_core::{
    BookingError, BookingResult, BoxedPaymentGateway, BoxedTicketingGateway, CabinOffer, Flight,
    PaymentGateway, PaymentIntent, PaymentRequest, PaymentStatus, PnrRequest, PnrResponse,
    SearchCriteria, SearchResults, ServiceMode, TicketIssuance, TicketingGateway, WebhookPayload,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::time::Duration;
use tracing::{instrument, warn};

const MOCK_PRICE: f64 = 250.0;
const MOCK_DURATION_MINUTES: u32 = 120;

/// The flight offered while the search provider is unavailable.
///
/// Same input, same flight: the id and keys are derived from the route and date.
pub fn mock_flight(origin: &str, destination: &str, date: NaiveDate) -> Flight {
    let origin = origin.trim().to_ascii_uppercase();
    let destination = destination.trim().to_ascii_uppercase();
    let departure = date.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc();
    let key = format!("MOCK-{}-{}-{}", origin, destination, date.format("%Y%m%d"));

    Flight {
        id: key.clone(),
        flight_number: "AE000".to_string(),
        origin,
        destination,
        departure_time: departure,
        arrival_time: departure + ChronoDuration::minutes(MOCK_DURATION_MINUTES as i64),
        duration_minutes: MOCK_DURATION_MINUTES,
        aircraft: "TBA".to_string(),
        economy: CabinOffer {
            price: MOCK_PRICE,
            seats_available: 9,
        },
        business: CabinOffer {
            price: MOCK_PRICE * 2.0,
            seats_available: 0,
        },
        baggage_allowance_kg: 20,
        services: Vec::new(),
        currency: Default::default(),
        search_key: key.clone(),
        class_key: format!("{}-Y", key),
    }
}

/// Degraded search results for the criteria
pub fn degraded_results(criteria: &SearchCriteria) -> SearchResults {
    let return_flights = criteria
        .return_date
        .filter(|_| criteria.is_return())
        .map(|date| vec![mock_flight(&criteria.destination, &criteria.origin, date)])
        .unwrap_or_default();

    SearchResults {
        outbound_flights: vec![mock_flight(&criteria.origin, &criteria.destination, criteria.departure_date)],
        return_flights,
        mode: ServiceMode::Degraded,
    }
}

/// Ticketing gateway that degrades search instead of failing it
pub struct FallbackTicketingGateway {
    inner: BoxedTicketingGateway,
}

impl FallbackTicketingGateway {
    pub fn new(inner: BoxedTicketingGateway) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TicketingGateway for FallbackTicketingGateway {
    #[instrument(skip(self, criteria))]
    async fn search(&self, criteria: &SearchCriteria) -> BookingResult<SearchResults> {
        match self.inner.search(criteria).await {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!(
                    provider = self.inner.provider_name(),
                    error = %e,
                    "Flight search failed, serving degraded results"
                );
                Ok(degraded_results(criteria))
            }
        }
    }

    async fn generate_pnr(&self, request: &PnrRequest) -> BookingResult<PnrResponse> {
        self.inner.generate_pnr(request).await
    }

    async fn issue_ticket(&self, booking_code: &str) -> BookingResult<TicketIssuance> {
        self.inner.issue_ticket(booking_code).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// Payment gateway that simulates success outside production
pub struct FallbackPaymentGateway {
    inner: BoxedPaymentGateway,
    allow_simulation: bool,
    delay: Duration,
}

impl FallbackPaymentGateway {
    pub fn new(inner: BoxedPaymentGateway, allow_simulation: bool, delay: Duration) -> Self {
        Self {
            inner,
            allow_simulation,
            delay,
        }
    }

    /// Provider-side failures; anything else is the caller's fault and is never simulated
    fn can_simulate(error: &BookingError) -> bool {
        matches!(
            error,
            BookingError::Gateway { .. }
                | BookingError::Network(_)
                | BookingError::Timeout(_)
                | BookingError::Configuration(_)
                | BookingError::Payment { .. }
        )
    }

    fn simulated_intent(request: &PaymentRequest) -> PaymentIntent {
        PaymentIntent {
            id: format!("SIM-{}", request.reference),
            reference: request.reference.clone(),
            amount: request.amount,
            payer: request.payer.clone(),
            status: PaymentStatus::Completed,
            checkout_url: None,
            simulated: true,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PaymentGateway for FallbackPaymentGateway {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn create_payment(&self, request: &PaymentRequest) -> BookingResult<PaymentIntent> {
        match self.inner.create_payment(request).await {
            Ok(intent) => Ok(intent),
            Err(e) if self.allow_simulation && Self::can_simulate(&e) => {
                warn!(
                    provider = self.inner.provider_name(),
                    error = %e,
                    delay_ms = self.delay.as_millis() as u64,
                    "Payment creation failed, simulating success"
                );
                tokio::time::sleep(self.delay).await;
                Ok(Self::simulated_intent(request))
            }
            Err(e) => Err(e),
        }
    }

    async fn payment_status(&self, payment_id: &str) -> BookingResult<PaymentStatus> {
        if payment_id.starts_with("SIM-") && self.allow_simulation {
            return Ok(PaymentStatus::Completed);
        }
        self.inner.payment_status(payment_id).await
    }

    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> BookingResult<WebhookPayload> {
        self.inner.verify_webhook(payload, signature)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
