//! # aero-core
//!
//! Booking orchestration and pricing core for aero-booking.
//!
//! This crate provides:
//! - `FareCalculator` and `CargoFeeCalculator` for pricing
//! - `FlightBookingOrchestrator` and `CargoBookingOrchestrator` workflow state machines
//! - `TicketingGateway`, `PaymentGateway` and `SettingsProvider` collaborator traits
//! - The cargo route table and schedule rules
//! - `BookingError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use aero_core::{FlightBookingOrchestrator, PassengerCounts, SearchCriteria};
//!
//! let mut booking = FlightBookingOrchestrator::new(gateway);
//! booking.search(SearchCriteria::one_way("DIL", "SIN", date, PassengerCounts::default())).await?;
//!
//! let flight = booking.session().outbound_candidates[0].clone();
//! booking.select_flight(&flight, false)?;
//! booking.submit_passengers(passengers, contact).await?;
//! booking.process_payment().await?;
//! ```

pub mod cargo;
pub mod cargo_booking;
pub mod cargo_fees;
pub mod error;
pub mod fare;
pub mod flight;
pub mod flight_booking;
pub mod gateway;
pub mod memory;
pub mod money;
pub mod passenger;
pub mod payment;
pub mod routes;

// Re-exports for convenience
pub use cargo::{
    CargoDetails, CargoFees, CargoSettings, CargoType, Dimensions, FeeSchedule, PackageKind,
    PackageRecord, PickupRequest, PickupService, RoutePriceOverride, RoutePrices,
};
pub use cargo_booking::{CargoBookingOrchestrator, CargoSearch, CargoSession, CargoStep, CargoSummary};
pub use cargo_fees::{CargoFeeCalculator, CargoQuote, CargoQuoteRequest, FeeBreakdown, VolumeBasis};
pub use error::{BookingError, BookingResult, ErrorKind};
pub use fare::{FareBreakdown, FareCalculator, PassengerFares};
pub use flight::{
    CabinOffer, Flight, PassengerTicket, PnrRequest, PnrResponse, SearchCriteria, SearchResults,
    ServiceMode, TicketIssuance, TripType,
};
pub use flight_booking::{BookingSession, FlightBookingOrchestrator, FlightStep};
pub use gateway::{
    BoxedPaymentGateway, BoxedSettingsProvider, BoxedTicketingGateway, PaymentGateway,
    SettingsProvider, TicketingGateway,
};
pub use money::{Currency, Money};
pub use passenger::{ContactRecord, PassengerCounts, PassengerRecord, PassengerType, Salutation};
pub use payment::{PaymentIntent, PaymentRequest, PaymentStatus, WebhookPayload};
pub use routes::{validate_cargo_route, CargoRoute, RouteSchedule};
