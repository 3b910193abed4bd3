//! # Collaborator Traits
//!
//! The three external systems the orchestrators talk to. Implementations
//! live in `aero-gateway`; orchestrators receive them as `Arc<dyn Trait>`
//! at construction so tests can inject in-memory doubles.
//!
//! ```text
//! FlightBookingOrchestrator ──► TicketingGateway   (search, PNR, tickets)
//! CargoBookingOrchestrator  ──► SettingsProvider   (fee schedule, route prices)
//!                           └─► PaymentGateway     (intents, status, webhooks)
//! ```

use crate::cargo::CargoSettings;
use crate::error::BookingResult;
use crate::flight::{PnrRequest, PnrResponse, SearchCriteria, SearchResults, TicketIssuance};
use crate::payment::{PaymentIntent, PaymentRequest, PaymentStatus, WebhookPayload};
use async_trait::async_trait;
use std::sync::Arc;

/// Flight search, PNR generation and ticket issuance.
#[async_trait]
pub trait TicketingGateway: Send + Sync {
    /// Search flights for the criteria. Degraded results are flagged on
    /// `SearchResults::mode`.
    async fn search(&self, criteria: &SearchCriteria) -> BookingResult<SearchResults>;

    /// Reserve the selected flights for the passengers.
    async fn generate_pnr(&self, request: &PnrRequest) -> BookingResult<PnrResponse>;

    /// Issue tickets for a reserved booking code.
    async fn issue_ticket(&self, booking_code: &str) -> BookingResult<TicketIssuance>;

    /// Provider name, for logging
    fn provider_name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }
}

/// Payment intents and webhook verification.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest) -> BookingResult<PaymentIntent>;

    /// Current status of a provider-side payment id
    async fn payment_status(&self, payment_id: &str) -> BookingResult<PaymentStatus>;

    /// Verify a raw webhook body and parse it.
    ///
    /// `signature` is a header value when the provider sends one; otherwise
    /// the signature is read from the payload's `hmac` field.
    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> BookingResult<WebhookPayload>;

    fn provider_name(&self) -> &'static str;

    /// False for placeholder gateways standing in for missing credentials
    fn is_available(&self) -> bool {
        true
    }
}

/// Read-only access to the admin-managed cargo settings record.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn load(&self) -> BookingResult<CargoSettings>;

    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared ticketing gateway (dynamic dispatch)
pub type BoxedTicketingGateway = Arc<dyn TicketingGateway>;

/// Type alias for a shared payment gateway
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Type alias for a shared settings provider
pub type BoxedSettingsProvider = Arc<dyn SettingsProvider>;
