//! # Ticketing Provider Client
//!
//! Flight search, PNR generation and ticket issuance over the provider's
//! JSON API. Each call is retried on transient faults per the configured
//! `RetryPolicy`.

use crate::client::{build_client, read_json, transport_error};
use crate::config::TicketingConfig;
use aero_core::{
    BookingError, BookingResult, PnrRequest, PnrResponse, SearchCriteria, SearchResults,
    TicketIssuance, TicketingGateway,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

const PROVIDER: &str = "ticketing";

/// Ticketing provider over HTTP
pub struct HttpTicketingGateway {
    config: TicketingConfig,
    client: Client,
}

impl HttpTicketingGateway {
    pub fn new(config: TicketingConfig) -> Self {
        let client = build_client(config.timeout);
        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> BookingResult<Self> {
        let config = TicketingConfig::from_env()?;
        Ok(Self::new(config))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> BookingResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        self.config
            .retry
            .retry(path, || async {
                debug!(%url, "Calling ticketing provider");
                let response = self
                    .client
                    .post(&url)
                    .header("Authorization", self.config.auth_header())
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| transport_error(PROVIDER, e))?;
                read_json(PROVIDER, response).await
            })
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketRequest<'a> {
    booking_code: &'a str,
}

#[async_trait]
impl TicketingGateway for HttpTicketingGateway {
    #[instrument(skip(self, criteria), fields(origin = %criteria.origin, destination = %criteria.destination))]
    async fn search(&self, criteria: &SearchCriteria) -> BookingResult<SearchResults> {
        let results: SearchResults = self.post("search", criteria).await?;
        info!(
            outbound = results.outbound_flights.len(),
            inbound = results.return_flights.len(),
            "Flight search answered"
        );
        Ok(results)
    }

    #[instrument(skip(self, request), fields(flights = request.flights.len()))]
    async fn generate_pnr(&self, request: &PnrRequest) -> BookingResult<PnrResponse> {
        let response: PnrResponse = self.post("pnr", request).await?;
        info!(booking_code = %response.booking_code, status = %response.status, "PNR created");
        Ok(response)
    }

    #[instrument(skip(self))]
    async fn issue_ticket(&self, booking_code: &str) -> BookingResult<TicketIssuance> {
        if booking_code.trim().is_empty() {
            return Err(BookingError::Validation("Booking code is required".to_string()));
        }
        let issuance: TicketIssuance = self.post("tickets", &TicketRequest { booking_code }).await?;
        info!(success = issuance.success, tickets = issuance.passengers.len(), "Ticket issuance answered");
        Ok(issuance)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
