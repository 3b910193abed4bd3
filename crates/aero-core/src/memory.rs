//! In-memory collaborator implementations for tests and local runs.

use crate::cargo::CargoSettings;
use crate::error::{BookingError, BookingResult};
use crate::flight::{
    CabinOffer, Flight, PassengerTicket, PnrRequest, PnrResponse, SearchCriteria, SearchResults,
    ServiceMode, TicketIssuance,
};
use crate::gateway::{PaymentGateway, SettingsProvider, TicketingGateway};
use crate::money::Currency;
use crate::payment::{PaymentIntent, PaymentRequest, PaymentStatus, WebhookPayload};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A flight offer with the economy fare set to `price`
pub fn sample_flight(id: &str, origin: &str, destination: &str, date: NaiveDate, price: f64) -> Flight {
    let departure = date
        .and_hms_opt(8, 30, 0)
        .unwrap_or_default()
        .and_utc();
    Flight {
        id: id.to_string(),
        flight_number: format!("AE{}", id.to_ascii_uppercase()),
        origin: origin.to_string(),
        destination: destination.to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::minutes(150),
        duration_minutes: 150,
        aircraft: "ATR 72-600".to_string(),
        economy: CabinOffer {
            price,
            seats_available: 40,
        },
        business: CabinOffer {
            price: price * 2.5,
            seats_available: 6,
        },
        baggage_allowance_kg: 20,
        services: vec!["meal".to_string()],
        currency: Currency::USD,
        search_key: format!("sk-{}", id),
        class_key: format!("ck-{}", id),
    }
}

#[derive(Debug, Default)]
struct TicketingState {
    outbound: Vec<Flight>,
    inbound: Vec<Flight>,
    fail_search: bool,
    fail_pnr: bool,
    reject_tickets: bool,
    search_calls: u32,
    last_criteria: Option<SearchCriteria>,
    last_pnr: Option<PnrRequest>,
    next_code: u32,
}

/// Ticketing provider double with canned flights and failure switches
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketingGateway {
    state: Arc<Mutex<TicketingState>>,
}

impl InMemoryTicketingGateway {
    pub fn new(outbound: Vec<Flight>, inbound: Vec<Flight>) -> Self {
        let gateway = Self::default();
        {
            let mut state = lock(&gateway.state);
            state.outbound = outbound;
            state.inbound = inbound;
        }
        gateway
    }

    pub fn set_fail_search(&self, fail: bool) {
        lock(&self.state).fail_search = fail;
    }

    pub fn set_fail_pnr(&self, fail: bool) {
        lock(&self.state).fail_pnr = fail;
    }

    /// Ticket issuance answers `success: false`
    pub fn set_reject_tickets(&self, reject: bool) {
        lock(&self.state).reject_tickets = reject;
    }

    pub fn search_calls(&self) -> u32 {
        lock(&self.state).search_calls
    }

    pub fn last_criteria(&self) -> Option<SearchCriteria> {
        lock(&self.state).last_criteria.clone()
    }

    pub fn last_pnr(&self) -> Option<PnrRequest> {
        lock(&self.state).last_pnr.clone()
    }
}

#[async_trait]
impl TicketingGateway for InMemoryTicketingGateway {
    async fn search(&self, criteria: &SearchCriteria) -> BookingResult<SearchResults> {
        let mut state = lock(&self.state);
        state.search_calls += 1;
        state.last_criteria = Some(criteria.clone());
        if state.fail_search {
            return Err(BookingError::Network("search unavailable".to_string()));
        }
        Ok(SearchResults {
            outbound_flights: state.outbound.clone(),
            return_flights: if criteria.is_return() {
                state.inbound.clone()
            } else {
                Vec::new()
            },
            mode: ServiceMode::Live,
        })
    }

    async fn generate_pnr(&self, request: &PnrRequest) -> BookingResult<PnrResponse> {
        let mut state = lock(&self.state);
        if state.fail_pnr {
            return Err(BookingError::gateway("memory", Some(500), "PNR generation failed"));
        }
        state.next_code += 1;
        state.last_pnr = Some(request.clone());

        let priced: f64 = request
            .flights
            .iter()
            .filter_map(|key| {
                state
                    .outbound
                    .iter()
                    .chain(state.inbound.iter())
                    .find(|f| f.search_key == key.search_key)
            })
            .map(|f| f.economy.price)
            .sum();
        let travellers = request.passengers.adult.len() + request.passengers.child.len();

        Ok(PnrResponse {
            booking_code: format!("PNR{:03}", state.next_code),
            status: "HK".to_string(),
            total_amount: priced * travellers as f64,
        })
    }

    async fn issue_ticket(&self, booking_code: &str) -> BookingResult<TicketIssuance> {
        let state = lock(&self.state);
        if state.reject_tickets {
            return Ok(TicketIssuance {
                success: false,
                passengers: Vec::new(),
            });
        }
        let passengers = state
            .last_pnr
            .iter()
            .flat_map(|pnr| {
                pnr.passengers
                    .adult
                    .iter()
                    .chain(&pnr.passengers.child)
                    .chain(&pnr.passengers.infant)
            })
            .enumerate()
            .map(|(i, p)| PassengerTicket {
                name: format!("{} {}", p.first_name, p.last_name),
                ticket_number: format!("{}-{:02}", booking_code, i + 1),
            })
            .collect();
        Ok(TicketIssuance {
            success: true,
            passengers,
        })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Default)]
struct PaymentState {
    intents: HashMap<String, PaymentIntent>,
    fail_on_create: bool,
    next_id: u32,
}

/// Payment provider double; intents stay pending until `set_status`
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<PaymentState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_create(&self, fail: bool) {
        lock(&self.state).fail_on_create = fail;
    }

    pub fn set_status(&self, payment_id: &str, status: PaymentStatus) {
        if let Some(intent) = lock(&self.state).intents.get_mut(payment_id) {
            intent.status = status;
        }
    }

    pub fn payment_count(&self) -> usize {
        lock(&self.state).intents.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> BookingResult<PaymentIntent> {
        if request.amount.amount <= 0 {
            return Err(BookingError::Validation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        let mut state = lock(&self.state);
        if state.fail_on_create {
            return Err(BookingError::Payment {
                reason: "Payment declined".to_string(),
            });
        }
        state.next_id += 1;
        let intent = PaymentIntent {
            id: format!("PAY-{:04}", state.next_id),
            reference: request.reference.clone(),
            amount: request.amount,
            payer: request.payer.clone(),
            status: PaymentStatus::Pending,
            checkout_url: Some(format!("https://pay.example.test/{}", request.reference)),
            simulated: false,
            created_at: Utc::now(),
        };
        state.intents.insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    async fn payment_status(&self, payment_id: &str) -> BookingResult<PaymentStatus> {
        lock(&self.state)
            .intents
            .get(payment_id)
            .map(|intent| intent.status)
            .ok_or_else(|| BookingError::gateway("memory", Some(404), format!("Unknown payment {}", payment_id)))
    }

    /// Accepts any JSON payload; signatures are not checked
    fn verify_webhook(&self, payload: &[u8], _signature: Option<&str>) -> BookingResult<WebhookPayload> {
        serde_json::from_slice(payload).map_err(|e| BookingError::WebhookParse(e.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Settings store double
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsProvider {
    settings: Arc<Mutex<Option<CargoSettings>>>,
    loads: Arc<Mutex<u32>>,
}

impl InMemorySettingsProvider {
    pub fn new(settings: CargoSettings) -> Self {
        Self {
            settings: Arc::new(Mutex::new(Some(settings))),
            loads: Arc::default(),
        }
    }

    /// A store that always fails to load
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set(&self, settings: Option<CargoSettings>) {
        *lock(&self.settings) = settings;
    }

    /// Number of `load` calls so far
    pub fn loads(&self) -> u32 {
        *lock(&self.loads)
    }
}

#[async_trait]
impl SettingsProvider for InMemorySettingsProvider {
    async fn load(&self) -> BookingResult<CargoSettings> {
        *lock(&self.loads) += 1;
        lock(&self.settings)
            .clone()
            .ok_or_else(|| BookingError::Network("settings store unavailable".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
