//! Placeholder gateway for providers whose credentials are missing.
//!
//! The service still starts; every call fails with a `Configuration` error
//! naming what is missing, and `is_available` reports false.

use aero_core::{
    BookingError, BookingResult, CargoSettings, PaymentGateway, PaymentIntent, PaymentRequest,
    PaymentStatus, PnrRequest, PnrResponse, SearchCriteria, SearchResults, SettingsProvider,
    TicketIssuance, TicketingGateway, WebhookPayload,
};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct UnavailableGateway {
    provider: &'static str,
    reason: String,
}

impl UnavailableGateway {
    pub fn new(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            provider,
            reason: reason.into(),
        }
    }

    fn error(&self) -> BookingError {
        BookingError::Configuration(format!("{} provider is not configured: {}", self.provider, self.reason))
    }
}

#[async_trait]
impl TicketingGateway for UnavailableGateway {
    async fn search(&self, _criteria: &SearchCriteria) -> BookingResult<SearchResults> {
        Err(self.error())
    }

    async fn generate_pnr(&self, _request: &PnrRequest) -> BookingResult<PnrResponse> {
        Err(self.error())
    }

    async fn issue_ticket(&self, _booking_code: &str) -> BookingResult<TicketIssuance> {
        Err(self.error())
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[async_trait]
impl PaymentGateway for UnavailableGateway {
    async fn create_payment(&self, _request: &PaymentRequest) -> BookingResult<PaymentIntent> {
        Err(self.error())
    }

    async fn payment_status(&self, _payment_id: &str) -> BookingResult<PaymentStatus> {
        Err(self.error())
    }

    fn verify_webhook(&self, _payload: &[u8], _signature: Option<&str>) -> BookingResult<WebhookPayload> {
        Err(self.error())
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[async_trait]
impl SettingsProvider for UnavailableGateway {
    async fn load(&self) -> BookingResult<CargoSettings> {
        Err(self.error())
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }
}
