//! # Payment Provider Client
//!
//! Payment requests are created with a form-encoded POST and answered with
//! a hosted checkout URL. Completion arrives either through a signed
//! webhook (see [`crate::webhook`]) or by polling the request status.

use crate::client::{build_client, read_json, transport_error};
use crate::config::PaymentConfig;
use crate::webhook::verify_webhook_payload;
use aero_core::{
    BookingError, BookingResult, PaymentGateway, PaymentIntent, PaymentRequest, PaymentStatus,
    WebhookPayload,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument};

const PROVIDER: &str = "payment";

/// Payment provider over HTTP
pub struct HttpPaymentGateway {
    config: PaymentConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestResponse {
    id: String,
    status: String,
    #[serde(default)]
    url: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        let client = build_client(config.timeout);
        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> BookingResult<Self> {
        let config = PaymentConfig::from_env()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("X-BUSINESS-API-KEY", &self.config.api_key)
            .header("X-Requested-With", "XMLHttpRequest");
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn form_fields(&self, request: &PaymentRequest) -> Vec<(&'static str, String)> {
        vec![
            ("amount", request.amount.to_decimal_string()),
            ("currency", request.amount.currency.as_str().to_string()),
            ("email", request.payer.email.clone()),
            ("name", request.payer.name.clone()),
            ("phone", request.payer.phone.clone()),
            ("reference_number", request.reference.clone()),
            ("redirect_url", self.config.redirect_url.clone()),
            ("webhook", self.config.webhook_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
        ]
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(reference = %request.reference, amount = %request.amount.display()))]
    async fn create_payment(&self, request: &PaymentRequest) -> BookingResult<PaymentIntent> {
        if request.amount.amount <= 0 {
            return Err(BookingError::Validation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }

        let url = self.config.endpoint("payment-requests");
        let fields = self.form_fields(request);

        let response: PaymentRequestResponse = self
            .config
            .retry
            .retry("create_payment", || async {
                debug!(%url, "Creating payment request");
                let response = self
                    .authorize(self.client.post(&url))
                    .form(&fields)
                    .send()
                    .await
                    .map_err(|e| transport_error(PROVIDER, e))?;
                read_json(PROVIDER, response).await
            })
            .await?;

        let status = PaymentStatus::from_provider(&response.status);
        info!(payment_id = %response.id, status = %status, "Payment request created");

        Ok(PaymentIntent {
            id: response.id,
            reference: request.reference.clone(),
            amount: request.amount,
            payer: request.payer.clone(),
            status,
            checkout_url: response.url,
            simulated: false,
            created_at: Utc::now(),
        })
    }

    #[instrument(skip(self))]
    async fn payment_status(&self, payment_id: &str) -> BookingResult<PaymentStatus> {
        let url = self.config.endpoint(&format!("payment-requests/{}", payment_id));

        let response: PaymentRequestResponse = self
            .config
            .retry
            .retry("payment_status", || async {
                let response = self
                    .authorize(self.client.get(&url))
                    .send()
                    .await
                    .map_err(|e| transport_error(PROVIDER, e))?;
                read_json(PROVIDER, response).await
            })
            .await?;

        let status = PaymentStatus::from_provider(&response.status);
        debug!(payment_id, status = %status, "Payment status fetched");
        Ok(status)
    }

    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> BookingResult<WebhookPayload> {
        verify_webhook_payload(&self.config.webhook_secret, payload, signature)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
