//! # Flight Booking Workflow
//!
//! Drives one passenger booking through its five steps:
//!
//! ```text
//! Search(1) ──► SelectFlight(2) ──► PassengerDetails(3) ──► Payment(4) ──► Confirmation(5)
//!    ▲               │  ▲                  │  ▲                 │
//!    └── go_back ────┘  └──── go_back ─────┘  └──── go_back ────┘
//! ```
//!
//! A failed transition records its message in `last_error` and leaves the
//! step unchanged. Going back discards everything captured by the
//! transitions into the steps that were left.

use crate::error::{BookingError, BookingResult};
use crate::fare::{FareBreakdown, FareCalculator};
use crate::flight::{Flight, PassengerTicket, PnrRequest, SearchCriteria, ServiceMode};
use crate::gateway::BoxedTicketingGateway;
use crate::money::Money;
use crate::passenger::{validate_passenger_records, ContactRecord, PassengerRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Workflow steps, numbered as shown to the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStep {
    Search = 1,
    SelectFlight = 2,
    PassengerDetails = 3,
    Payment = 4,
    Confirmation = 5,
}

impl FlightStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn previous(&self) -> Self {
        match self {
            FlightStep::Search | FlightStep::SelectFlight => FlightStep::Search,
            FlightStep::PassengerDetails => FlightStep::SelectFlight,
            FlightStep::Payment => FlightStep::PassengerDetails,
            FlightStep::Confirmation => FlightStep::Payment,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlightStep::Confirmation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStep::Search => "search",
            FlightStep::SelectFlight => "select_flight",
            FlightStep::PassengerDetails => "passenger_details",
            FlightStep::Payment => "payment",
            FlightStep::Confirmation => "confirmation",
        }
    }
}

impl Default for FlightStep {
    fn default() -> Self {
        FlightStep::Search
    }
}

impl std::fmt::Display for FlightStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything captured for one flight booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingSession {
    pub step: FlightStep,
    pub criteria: Option<SearchCriteria>,
    pub outbound_candidates: Vec<Flight>,
    pub return_candidates: Vec<Flight>,
    /// Set once a search has returned
    pub search_mode: Option<ServiceMode>,
    pub selected_outbound: Option<Flight>,
    /// Only ever set on return trips
    pub selected_return: Option<Flight>,
    pub fare: Option<FareBreakdown>,
    pub passengers: Vec<PassengerRecord>,
    pub contact: Option<ContactRecord>,
    pub booking_code: Option<String>,
    pub pnr_status: Option<String>,
    /// Total reported by the provider at PNR generation
    pub total_amount: Option<Money>,
    pub tickets: Vec<PassengerTicket>,
    pub last_error: Option<String>,
}

impl BookingSession {
    pub fn is_return_trip(&self) -> bool {
        self.criteria.as_ref().is_some_and(SearchCriteria::is_return)
    }

    pub fn is_degraded(&self) -> bool {
        self.search_mode == Some(ServiceMode::Degraded)
    }

    fn clear_search_results(&mut self) {
        self.outbound_candidates.clear();
        self.return_candidates.clear();
        self.search_mode = None;
    }

    fn clear_selection(&mut self) {
        self.selected_outbound = None;
        self.selected_return = None;
        self.fare = None;
    }

    fn clear_reservation(&mut self) {
        self.passengers.clear();
        self.contact = None;
        self.booking_code = None;
        self.pnr_status = None;
        self.total_amount = None;
    }
}

/// Flight booking state machine over an injected ticketing gateway
pub struct FlightBookingOrchestrator {
    gateway: BoxedTicketingGateway,
    session: BookingSession,
}

impl FlightBookingOrchestrator {
    pub fn new(gateway: BoxedTicketingGateway) -> Self {
        Self {
            gateway,
            session: BookingSession::default(),
        }
    }

    pub fn session(&self) -> &BookingSession {
        &self.session
    }

    pub fn step(&self) -> FlightStep {
        self.session.step
    }

    /// Search flights and move to flight selection.
    ///
    /// Allowed from Search and from SelectFlight (a fresh search replaces
    /// the candidates and any selection).
    #[instrument(skip(self, criteria), fields(origin = %criteria.origin, destination = %criteria.destination))]
    pub async fn search(&mut self, criteria: SearchCriteria) -> BookingResult<()> {
        let result = self.run_search(criteria).await;
        self.record(result)
    }

    async fn run_search(&mut self, criteria: SearchCriteria) -> BookingResult<()> {
        self.require_at_most("search", FlightStep::SelectFlight)?;
        criteria.validate()?;

        let results = self.gateway.search(&criteria).await?;
        if results.is_degraded() {
            warn!(
                provider = self.gateway.provider_name(),
                "Search returned degraded results"
            );
        }
        info!(
            outbound = results.outbound_flights.len(),
            inbound = results.return_flights.len(),
            "Search complete"
        );

        self.session.clear_selection();
        self.session.outbound_candidates = results.outbound_flights;
        self.session.return_candidates = results.return_flights;
        self.session.search_mode = Some(results.mode);
        self.session.criteria = Some(criteria);
        self.session.step = FlightStep::SelectFlight;
        Ok(())
    }

    /// Record a flight for one leg.
    ///
    /// One-way trips advance as soon as the outbound is chosen; return trips
    /// advance once both legs are chosen, in either order.
    #[instrument(skip(self, flight), fields(flight_id = %flight.id))]
    pub fn select_flight(&mut self, flight: &Flight, is_return: bool) -> BookingResult<FlightStep> {
        let result = self.run_select(flight, is_return);
        self.record(result)
    }

    fn run_select(&mut self, flight: &Flight, is_return: bool) -> BookingResult<FlightStep> {
        self.require("select_flight", FlightStep::SelectFlight)?;
        let criteria = self.criteria()?.clone();

        if is_return && !criteria.is_return() {
            return Err(BookingError::Validation(
                "Cannot select a return flight on a one-way trip".to_string(),
            ));
        }

        let candidates = if is_return {
            &self.session.return_candidates
        } else {
            &self.session.outbound_candidates
        };
        let chosen = candidates
            .iter()
            .find(|f| f.id == flight.id)
            .cloned()
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "Flight {} is not among the search results",
                    flight.id
                ))
            })?;

        let (outbound, inbound) = if is_return {
            (self.session.selected_outbound.clone(), Some(chosen))
        } else {
            (Some(chosen), self.session.selected_return.clone())
        };

        let fare = match (&outbound, &inbound) {
            (Some(out), None) if !criteria.is_return() => Some(Self::quote_fare(&criteria, out, None)?),
            (Some(out), Some(back)) => Some(Self::quote_fare(&criteria, out, Some(back))?),
            _ => None,
        };

        self.session.selected_outbound = outbound;
        self.session.selected_return = inbound;
        if let Some(fare) = fare {
            info!(grand_total = %fare.grand_total.display(), "Flights selected");
            self.session.fare = Some(fare);
            self.session.step = FlightStep::PassengerDetails;
        }
        Ok(self.session.step)
    }

    /// Change the departure (or return) date and search again.
    ///
    /// The step does not change; selections that are still offered survive.
    #[instrument(skip(self))]
    pub async fn change_date(&mut self, date: NaiveDate, is_return: bool) -> BookingResult<()> {
        let result = self.run_change_date(date, is_return).await;
        self.record(result)
    }

    async fn run_change_date(&mut self, date: NaiveDate, is_return: bool) -> BookingResult<()> {
        self.require("change_date", FlightStep::SelectFlight)?;
        let mut criteria = self.criteria()?.clone();

        if is_return {
            if !criteria.is_return() {
                return Err(BookingError::Validation(
                    "One-way trips have no return date".to_string(),
                ));
            }
            criteria.return_date = Some(date);
        } else {
            criteria.departure_date = date;
        }
        criteria.validate()?;

        let results = self.gateway.search(&criteria).await?;
        if results.is_degraded() {
            warn!(%date, "Date change search returned degraded results");
        }

        let still_offered = |selected: &Option<Flight>, offered: &[Flight]| {
            selected
                .as_ref()
                .filter(|s| offered.iter().any(|f| f.id == s.id))
                .cloned()
        };
        self.session.selected_outbound =
            still_offered(&self.session.selected_outbound, &results.outbound_flights);
        self.session.selected_return =
            still_offered(&self.session.selected_return, &results.return_flights);
        self.session.fare = None;
        self.session.outbound_candidates = results.outbound_flights;
        self.session.return_candidates = results.return_flights;
        self.session.search_mode = Some(results.mode);
        self.session.criteria = Some(criteria);
        Ok(())
    }

    /// Validate travellers and reserve the selected flights.
    #[instrument(skip(self, passengers, contact), fields(passengers = passengers.len()))]
    pub async fn submit_passengers(
        &mut self,
        passengers: Vec<PassengerRecord>,
        contact: ContactRecord,
    ) -> BookingResult<()> {
        let result = self.run_submit_passengers(passengers, contact).await;
        self.record(result)
    }

    async fn run_submit_passengers(
        &mut self,
        passengers: Vec<PassengerRecord>,
        contact: ContactRecord,
    ) -> BookingResult<()> {
        self.require("submit_passengers", FlightStep::PassengerDetails)?;
        let criteria = self.criteria()?;
        let outbound = self.session.selected_outbound.as_ref().ok_or_else(|| {
            BookingError::Validation("No outbound flight selected".to_string())
        })?;

        validate_passenger_records(&criteria.passengers, &passengers, criteria.last_travel_date())?;
        contact.validate()?;

        let request = PnrRequest::new(
            &passengers,
            &contact,
            outbound,
            self.session.selected_return.as_ref(),
        );
        let currency = outbound.currency;
        let response = self.gateway.generate_pnr(&request).await?;

        if response.booking_code.trim().is_empty() {
            return Err(BookingError::gateway(
                self.gateway.provider_name(),
                None,
                "PNR response carried no booking code",
            ));
        }
        info!(booking_code = %response.booking_code, status = %response.status, "PNR generated");

        self.session.passengers = passengers;
        self.session.contact = Some(contact);
        self.session.booking_code = Some(response.booking_code);
        self.session.pnr_status = Some(response.status);
        self.session.total_amount = Some(Money::new(response.total_amount, currency));
        self.session.step = FlightStep::Payment;
        Ok(())
    }

    /// Issue tickets for the reserved booking.
    #[instrument(skip(self))]
    pub async fn process_payment(&mut self) -> BookingResult<()> {
        let result = self.run_process_payment().await;
        self.record(result)
    }

    async fn run_process_payment(&mut self) -> BookingResult<()> {
        self.require("process_payment", FlightStep::Payment)?;
        let booking_code = self
            .session
            .booking_code
            .clone()
            .ok_or_else(|| BookingError::Validation("No booking code to ticket".to_string()))?;

        let issuance = self.gateway.issue_ticket(&booking_code).await?;
        if !issuance.success {
            return Err(BookingError::gateway(
                self.gateway.provider_name(),
                None,
                format!("Ticket issuance rejected for {}", booking_code),
            ));
        }
        info!(%booking_code, tickets = issuance.passengers.len(), "Tickets issued");

        self.session.tickets = issuance.passengers;
        self.session.step = FlightStep::Confirmation;
        Ok(())
    }

    /// Step back once, discarding what the left step produced.
    pub fn go_back(&mut self) -> FlightStep {
        let from = self.session.step;
        let to = from.previous();
        match from {
            FlightStep::Search => {}
            FlightStep::SelectFlight => self.session.clear_search_results(),
            FlightStep::PassengerDetails => self.session.clear_selection(),
            FlightStep::Payment => self.session.clear_reservation(),
            FlightStep::Confirmation => self.session.tickets.clear(),
        }
        self.session.step = to;
        self.session.last_error = None;
        to
    }

    /// Discard the whole session
    pub fn reset(&mut self) {
        self.session = BookingSession::default();
    }

    /// Close a confirmed booking and start over
    pub fn acknowledge(&mut self) -> BookingResult<()> {
        let result = self.require("acknowledge", FlightStep::Confirmation);
        self.record(result)?;
        info!(booking_code = ?self.session.booking_code, "Booking acknowledged");
        self.reset();
        Ok(())
    }

    /// Price the selected legs at their economy fares
    pub fn quote_fare(
        criteria: &SearchCriteria,
        outbound: &Flight,
        inbound: Option<&Flight>,
    ) -> BookingResult<FareBreakdown> {
        let adult_price = outbound.economy.price + inbound.map_or(0.0, |f| f.economy.price);
        FareCalculator::calculate(adult_price, outbound.currency, &criteria.passengers)
    }

    fn criteria(&self) -> BookingResult<&SearchCriteria> {
        self.session
            .criteria
            .as_ref()
            .ok_or_else(|| BookingError::Internal("Session has no search criteria".to_string()))
    }

    fn require(&self, operation: &'static str, step: FlightStep) -> BookingResult<()> {
        if self.session.step != step {
            return Err(BookingError::InvalidStep {
                operation,
                expected: step.number(),
                actual: self.session.step.number(),
            });
        }
        Ok(())
    }

    fn require_at_most(&self, operation: &'static str, step: FlightStep) -> BookingResult<()> {
        if self.session.step > step {
            return Err(BookingError::InvalidStep {
                operation,
                expected: step.number(),
                actual: self.session.step.number(),
            });
        }
        Ok(())
    }

    fn record<T>(&mut self, result: BookingResult<T>) -> BookingResult<T> {
        match &result {
            Ok(_) => self.session.last_error = None,
            Err(e) => {
                warn!(step = %self.session.step, error = %e, "Transition failed");
                self.session.last_error = Some(e.to_string());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{sample_flight, InMemoryTicketingGateway};
    use crate::passenger::{PassengerCounts, PassengerType, Salutation};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gateway() -> InMemoryTicketingGateway {
        InMemoryTicketingGateway::new(
            vec![
                sample_flight("out-1", "DIL", "SIN", date(2030, 3, 1), 299.0),
                sample_flight("out-2", "DIL", "SIN", date(2030, 3, 1), 349.0),
            ],
            vec![sample_flight("ret-1", "SIN", "DIL", date(2030, 3, 8), 199.0)],
        )
    }

    fn orchestrator(gateway: &InMemoryTicketingGateway) -> FlightBookingOrchestrator {
        FlightBookingOrchestrator::new(Arc::new(gateway.clone()))
    }

    fn one_way(counts: PassengerCounts) -> SearchCriteria {
        SearchCriteria::one_way("DIL", "SIN", date(2030, 3, 1), counts)
    }

    fn round_trip() -> SearchCriteria {
        SearchCriteria::round_trip("DIL", "SIN", date(2030, 3, 1), date(2030, 3, 8), PassengerCounts::default())
    }

    fn passenger(passenger_type: PassengerType, first: &str) -> PassengerRecord {
        PassengerRecord {
            passenger_type,
            salutation: Salutation::Ms,
            first_name: first.to_string(),
            last_name: "Guterres".to_string(),
            date_of_birth: date(1988, 7, 12),
            passport_number: format!("TL{}", first.len()),
            passport_expiry: date(2034, 1, 1),
            country: "TL".to_string(),
        }
    }

    fn contact() -> ContactRecord {
        ContactRecord::new("Ana Guterres", "+67077001122", "ana@example.tl")
    }

    async fn at_payment(gateway: &InMemoryTicketingGateway) -> FlightBookingOrchestrator {
        let mut booking = orchestrator(gateway);
        booking.search(one_way(PassengerCounts::default())).await.unwrap();
        let flight = booking.session().outbound_candidates[0].clone();
        booking.select_flight(&flight, false).unwrap();
        booking
            .submit_passengers(vec![passenger(PassengerType::Adult, "Ana")], contact())
            .await
            .unwrap();
        booking
    }

    #[tokio::test]
    async fn test_search_advances_to_selection() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);

        booking.search(one_way(PassengerCounts::default())).await.unwrap();

        assert_eq!(booking.step(), FlightStep::SelectFlight);
        assert_eq!(booking.session().outbound_candidates.len(), 2);
        assert!(booking.session().return_candidates.is_empty());
        assert!(!booking.session().is_degraded());
    }

    #[tokio::test]
    async fn test_invalid_search_never_reaches_gateway() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);

        let same = SearchCriteria::one_way("DIL", "dil", date(2030, 3, 1), PassengerCounts::default());
        assert!(booking.search(same).await.is_err());
        let too_many_infants = one_way(PassengerCounts::new(1, 0, 2));
        assert!(booking.search(too_many_infants).await.is_err());

        assert_eq!(gateway.search_calls(), 0);
        assert_eq!(booking.step(), FlightStep::Search);
        assert!(booking.session().criteria.is_none());
        assert!(booking.session().last_error.is_some());
    }

    #[tokio::test]
    async fn test_search_failure_stays_at_search() {
        let gateway = gateway();
        gateway.set_fail_search(true);
        let mut booking = orchestrator(&gateway);

        let err = booking.search(one_way(PassengerCounts::default())).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(booking.step(), FlightStep::Search);
        assert!(booking.session().last_error.as_deref().unwrap().contains("search unavailable"));
    }

    #[tokio::test]
    async fn test_one_way_selection_advances() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(one_way(PassengerCounts::new(2, 0, 1))).await.unwrap();

        let flight = booking.session().outbound_candidates[0].clone();
        let step = booking.select_flight(&flight, false).unwrap();

        assert_eq!(step, FlightStep::PassengerDetails);
        let fare = booking.session().fare.unwrap();
        assert_eq!(fare.grand_total.amount, 62790);
    }

    #[tokio::test]
    async fn test_return_trip_needs_both_legs() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(round_trip()).await.unwrap();

        let outbound = booking.session().outbound_candidates[0].clone();
        assert_eq!(booking.select_flight(&outbound, false).unwrap(), FlightStep::SelectFlight);
        assert!(booking.session().fare.is_none());

        let inbound = booking.session().return_candidates[0].clone();
        assert_eq!(booking.select_flight(&inbound, true).unwrap(), FlightStep::PassengerDetails);

        let fare = booking.session().fare.unwrap();
        assert_eq!(fare.fares.adult_fare.amount, 49800);
    }

    #[tokio::test]
    async fn test_return_leg_first_is_order_independent() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(round_trip()).await.unwrap();

        let inbound = booking.session().return_candidates[0].clone();
        let outbound = booking.session().outbound_candidates[1].clone();
        assert_eq!(booking.select_flight(&inbound, true).unwrap(), FlightStep::SelectFlight);
        assert_eq!(booking.select_flight(&outbound, false).unwrap(), FlightStep::PassengerDetails);
    }

    #[tokio::test]
    async fn test_selection_must_come_from_results() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(one_way(PassengerCounts::default())).await.unwrap();

        let stranger = sample_flight("ghost", "DIL", "SIN", date(2030, 3, 1), 10.0);
        assert!(booking.select_flight(&stranger, false).is_err());

        let outbound = booking.session().outbound_candidates[0].clone();
        assert!(booking.select_flight(&outbound, true).is_err());
        assert_eq!(booking.step(), FlightStep::SelectFlight);
    }

    #[tokio::test]
    async fn test_change_date_keeps_step() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(round_trip()).await.unwrap();
        let outbound = booking.session().outbound_candidates[0].clone();
        booking.select_flight(&outbound, false).unwrap();

        booking.change_date(date(2030, 3, 10), true).await.unwrap();

        assert_eq!(booking.step(), FlightStep::SelectFlight);
        assert_eq!(gateway.search_calls(), 2);
        assert_eq!(gateway.last_criteria().unwrap().return_date, Some(date(2030, 3, 10)));
        assert_eq!(booking.session().selected_outbound.as_ref().map(|f| f.id.as_str()), Some("out-1"));
    }

    #[tokio::test]
    async fn test_change_date_rejects_return_before_departure() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(round_trip()).await.unwrap();

        assert!(booking.change_date(date(2030, 2, 1), true).await.is_err());
        assert_eq!(gateway.search_calls(), 1);
        assert_eq!(booking.session().criteria.as_ref().unwrap().return_date, Some(date(2030, 3, 8)));
    }

    #[tokio::test]
    async fn test_submit_passengers_reserves() {
        let gateway = gateway();
        let booking = at_payment(&gateway).await;

        assert_eq!(booking.step(), FlightStep::Payment);
        assert_eq!(booking.session().booking_code.as_deref(), Some("PNR001"));
        assert_eq!(booking.session().total_amount.unwrap().amount, 29900);

        let pnr = gateway.last_pnr().unwrap();
        assert_eq!(pnr.passengers.adult.len(), 1);
        assert_eq!(pnr.flights[0].search_key, "sk-out-1");
    }

    #[tokio::test]
    async fn test_passenger_count_mismatch_rejected() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);
        booking.search(one_way(PassengerCounts::new(2, 0, 0))).await.unwrap();
        let flight = booking.session().outbound_candidates[0].clone();
        booking.select_flight(&flight, false).unwrap();

        let result = booking
            .submit_passengers(vec![passenger(PassengerType::Adult, "Ana")], contact())
            .await;

        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert_eq!(booking.step(), FlightStep::PassengerDetails);
        assert!(gateway.last_pnr().is_none());
    }

    #[tokio::test]
    async fn test_pnr_failure_stays_at_passenger_details() {
        let gateway = gateway();
        gateway.set_fail_pnr(true);
        let mut booking = orchestrator(&gateway);
        booking.search(one_way(PassengerCounts::default())).await.unwrap();
        let flight = booking.session().outbound_candidates[0].clone();
        booking.select_flight(&flight, false).unwrap();

        let result = booking
            .submit_passengers(vec![passenger(PassengerType::Adult, "Ana")], contact())
            .await;

        assert!(result.is_err());
        assert_eq!(booking.step(), FlightStep::PassengerDetails);
        assert!(booking.session().booking_code.is_none());
        assert!(booking.session().passengers.is_empty());
    }

    #[tokio::test]
    async fn test_go_back_from_payment_clears_reservation() {
        let gateway = gateway();
        let mut booking = at_payment(&gateway).await;

        assert_eq!(booking.go_back(), FlightStep::PassengerDetails);

        let session = booking.session();
        assert!(session.booking_code.is_none());
        assert!(session.total_amount.is_none());
        assert!(session.passengers.is_empty());
        assert!(session.selected_outbound.is_some());
        assert!(session.fare.is_some());
        assert!(session.criteria.is_some());
    }

    #[tokio::test]
    async fn test_go_back_chain() {
        let gateway = gateway();
        let mut booking = at_payment(&gateway).await;

        booking.go_back();
        assert_eq!(booking.go_back(), FlightStep::SelectFlight);
        assert!(booking.session().selected_outbound.is_none());
        assert!(!booking.session().outbound_candidates.is_empty());

        assert_eq!(booking.go_back(), FlightStep::Search);
        assert!(booking.session().outbound_candidates.is_empty());
        assert!(booking.session().criteria.is_some());

        assert_eq!(booking.go_back(), FlightStep::Search);
    }

    #[tokio::test]
    async fn test_ticketing_and_acknowledge() {
        let gateway = gateway();
        let mut booking = at_payment(&gateway).await;

        booking.process_payment().await.unwrap();
        assert_eq!(booking.step(), FlightStep::Confirmation);
        assert_eq!(booking.session().tickets.len(), 1);
        assert_eq!(booking.session().tickets[0].ticket_number, "PNR001-01");

        booking.acknowledge().unwrap();
        assert_eq!(booking.session(), &BookingSession::default());
    }

    #[tokio::test]
    async fn test_rejected_ticketing_stays_at_payment() {
        let gateway = gateway();
        gateway.set_reject_tickets(true);
        let mut booking = at_payment(&gateway).await;

        assert!(booking.process_payment().await.is_err());
        assert_eq!(booking.step(), FlightStep::Payment);
        assert!(booking.session().booking_code.is_some());
    }

    #[tokio::test]
    async fn test_out_of_order_operations() {
        let gateway = gateway();
        let mut booking = orchestrator(&gateway);

        let err = booking.process_payment().await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidStep { expected: 4, actual: 1, .. }));
        assert!(booking.acknowledge().is_err());
        assert_eq!(booking.step(), FlightStep::Search);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let gateway = gateway();
        let mut booking = at_payment(&gateway).await;
        booking.reset();
        assert_eq!(booking.step(), FlightStep::Search);
        assert!(booking.session().criteria.is_none());
    }
}
