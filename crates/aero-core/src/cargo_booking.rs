//! # Cargo Booking Workflow
//!
//! ```text
//! Search(1) ──► CargoDetails(2) ──► ContactDetails(3) ──► Summary(4) ──► Checkout(5) ──► Confirmation(6)
//! ```
//!
//! The fee schedule is read from the settings store the first time a
//! summary is prepared and kept for the rest of the session. When the
//! store cannot be reached the built-in fallback schedule prices the
//! shipment and nothing is cached, so the next summary tries again.

use crate::cargo::{CargoDetails, CargoFees, CargoSettings};
use crate::cargo_fees::{CargoFeeCalculator, CargoQuote, CargoQuoteRequest, VolumeBasis};
use crate::error::{BookingError, BookingResult};
use crate::gateway::{BoxedPaymentGateway, BoxedSettingsProvider};
use crate::money::Currency;
use crate::passenger::ContactRecord;
use crate::payment::{PaymentIntent, PaymentRequest, PaymentStatus};
use crate::routes::{currency_for_origin, normalize_code, pickup_available, validate_cargo_route, validate_ship_date};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CargoStep {
    Search = 1,
    CargoDetails = 2,
    ContactDetails = 3,
    Summary = 4,
    Checkout = 5,
    Confirmation = 6,
}

impl CargoStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn previous(&self) -> Self {
        match self {
            CargoStep::Search | CargoStep::CargoDetails => CargoStep::Search,
            CargoStep::ContactDetails => CargoStep::CargoDetails,
            CargoStep::Summary => CargoStep::ContactDetails,
            CargoStep::Checkout => CargoStep::Summary,
            CargoStep::Confirmation => CargoStep::Checkout,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CargoStep::Confirmation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CargoStep::Search => "search",
            CargoStep::CargoDetails => "cargo_details",
            CargoStep::ContactDetails => "contact_details",
            CargoStep::Summary => "summary",
            CargoStep::Checkout => "checkout",
            CargoStep::Confirmation => "confirmation",
        }
    }
}

impl Default for CargoStep {
    fn default() -> Self {
        CargoStep::Search
    }
}

impl std::fmt::Display for CargoStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Route and ship date chosen on the search step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoSearch {
    pub origin: String,
    pub destination: String,
    pub ship_date: NaiveDate,
}

impl CargoSearch {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, ship_date: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            ship_date,
        }
    }

    pub fn currency(&self) -> Currency {
        currency_for_origin(&self.origin)
    }
}

/// Priced shipment as confirmed on the summary step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoSummary {
    #[serde(flatten)]
    pub quote: CargoQuote,
    pub prepared_at: DateTime<Utc>,
}

impl CargoSummary {
    /// Totals must add up and be priced in `currency`
    pub fn validate(&self, currency: Currency) -> BookingResult<()> {
        let quote = &self.quote;
        let parts = [
            quote.fees.awb_fee,
            quote.fees.screening_fee,
            quote.fees.handling_fee,
            quote.fees.cargo_charge,
            quote.pickup_fee,
            quote.route_fee,
            quote.grand_total,
        ];
        if quote.currency != currency || parts.iter().any(|m| m.currency != currency) {
            return Err(BookingError::Validation(format!(
                "Summary must be priced in {}",
                currency
            )));
        }
        if parts.iter().any(|m| m.amount < 0) {
            return Err(BookingError::Validation(
                "Summary contains negative amounts".to_string(),
            ));
        }
        let sum = quote.fees.total() + quote.pickup_fee + quote.route_fee;
        if sum != quote.grand_total {
            return Err(BookingError::Validation(format!(
                "Summary total {} does not match its breakdown {}",
                quote.grand_total.display(),
                sum.display()
            )));
        }
        Ok(())
    }
}

/// Everything captured for one cargo booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoSession {
    pub step: CargoStep,
    pub search: Option<CargoSearch>,
    pub details: Option<CargoDetails>,
    pub total_weight_kg: Option<u64>,
    pub total_volume: Option<f64>,
    pub shipper: Option<ContactRecord>,
    pub consignee: Option<ContactRecord>,
    /// Last quote priced on the summary step; the only one `submit_summary` accepts
    #[serde(default)]
    pub prepared: Option<CargoSummary>,
    pub summary: Option<CargoSummary>,
    pub payment: Option<PaymentIntent>,
    pub last_error: Option<String>,
}

impl CargoSession {
    pub fn payment_reference(&self) -> Option<&str> {
        self.payment.as_ref().map(|p| p.reference.as_str())
    }
}

/// Cargo booking state machine over injected settings and payment providers
pub struct CargoBookingOrchestrator {
    settings_provider: BoxedSettingsProvider,
    payments: BoxedPaymentGateway,
    volume_basis: VolumeBasis,
    settings: Option<CargoSettings>,
    session: CargoSession,
}

impl CargoBookingOrchestrator {
    pub fn new(settings_provider: BoxedSettingsProvider, payments: BoxedPaymentGateway) -> Self {
        Self {
            settings_provider,
            payments,
            volume_basis: VolumeBasis::default(),
            settings: None,
            session: CargoSession::default(),
        }
    }

    pub fn with_volume_basis(mut self, basis: VolumeBasis) -> Self {
        self.volume_basis = basis;
        self
    }

    pub fn session(&self) -> &CargoSession {
        &self.session
    }

    pub fn step(&self) -> CargoStep {
        self.session.step
    }

    /// Cached settings snapshot, if one has been loaded
    pub fn cached_settings(&self) -> Option<&CargoSettings> {
        self.settings.as_ref()
    }

    /// Validate route and ship date against today's date
    pub fn search(&mut self, search: CargoSearch) -> BookingResult<()> {
        self.search_as_of(search, Utc::now().date_naive())
    }

    #[instrument(skip(self, search), fields(origin = %search.origin, destination = %search.destination, ship_date = %search.ship_date))]
    pub fn search_as_of(&mut self, search: CargoSearch, today: NaiveDate) -> BookingResult<()> {
        let result = self.run_search(search, today);
        self.record(result)
    }

    fn run_search(&mut self, search: CargoSearch, today: NaiveDate) -> BookingResult<()> {
        self.require("search", CargoStep::Search)?;
        let route = validate_cargo_route(&search.origin, &search.destination)?;
        validate_ship_date(route, search.ship_date, today)?;

        info!(schedule = ?route.schedule, "Cargo route accepted");
        self.session.search = Some(CargoSearch::new(route.origin, route.destination, search.ship_date));
        self.session.step = CargoStep::CargoDetails;
        Ok(())
    }

    #[instrument(skip(self, details), fields(packages = details.packages.len()))]
    pub fn submit_cargo_details(&mut self, details: CargoDetails) -> BookingResult<()> {
        let result = self.run_submit_details(details);
        self.record(result)
    }

    fn run_submit_details(&mut self, details: CargoDetails) -> BookingResult<()> {
        self.require("submit_cargo_details", CargoStep::CargoDetails)?;
        let search = self.current_search()?;
        details.validate()?;

        if let Some(pickup) = &details.pickup {
            if !pickup_available(&search.origin) {
                return Err(BookingError::Route(format!(
                    "Pickup is not offered from {}",
                    normalize_code(&search.origin)
                )));
            }
            if pickup.pickup_date > search.ship_date {
                return Err(BookingError::Validation(
                    "Pickup date must not be after the ship date".to_string(),
                ));
            }
        }

        let weight = CargoFeeCalculator::total_weight(&details.packages);
        let volume = CargoFeeCalculator::total_volume(&details.packages, self.volume_basis);
        info!(weight_kg = weight, volume, "Cargo details captured");

        self.session.total_weight_kg = Some(weight);
        self.session.total_volume = Some(volume);
        self.session.details = Some(details);
        self.session.step = CargoStep::ContactDetails;
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn submit_contacts(&mut self, shipper: ContactRecord, consignee: ContactRecord) -> BookingResult<()> {
        let result = self.run_submit_contacts(shipper, consignee);
        self.record(result)
    }

    fn run_submit_contacts(&mut self, shipper: ContactRecord, consignee: ContactRecord) -> BookingResult<()> {
        self.require("submit_contacts", CargoStep::ContactDetails)?;
        shipper.validate()?;
        consignee.validate()?;

        self.session.shipper = Some(shipper);
        self.session.consignee = Some(consignee);
        self.session.step = CargoStep::Summary;
        Ok(())
    }

    /// Price the shipment for the summary step. Does not change the step.
    ///
    /// `rate_override` replaces the four schedule rates for this quote only.
    #[instrument(skip(self, rate_override), fields(overridden = rate_override.is_some()))]
    pub async fn prepare_summary(&mut self, rate_override: Option<CargoFees>) -> BookingResult<CargoSummary> {
        let result = self.run_prepare_summary(rate_override).await;
        self.record(result)
    }

    async fn run_prepare_summary(&mut self, rate_override: Option<CargoFees>) -> BookingResult<CargoSummary> {
        self.require("prepare_summary", CargoStep::Summary)?;
        if let Some(rates) = &rate_override {
            rates.validate()?;
        }
        let search = self.current_search()?.clone();
        let details = self
            .session
            .details
            .clone()
            .ok_or_else(|| BookingError::Internal("Session has no cargo details".to_string()))?;

        let settings = self.load_settings().await;
        let request = CargoQuoteRequest {
            origin: search.origin,
            destination: search.destination,
            cargo_type: details.cargo_type,
            packages: details.packages,
            pickup_requested: details.pickup.is_some(),
            rate_override,
            volume_basis: self.volume_basis,
        };
        let quote = CargoFeeCalculator::quote(&request, settings.as_ref());
        if quote.schedule_fallback {
            warn!("Cargo priced with the fallback fee schedule");
        }
        info!(grand_total = %quote.grand_total.display(), "Cargo summary prepared");

        let summary = CargoSummary {
            quote,
            prepared_at: Utc::now(),
        };
        self.session.prepared = Some(summary.clone());
        Ok(summary)
    }

    #[instrument(skip(self, summary), fields(total = %summary.quote.grand_total.display()))]
    pub fn submit_summary(&mut self, summary: CargoSummary) -> BookingResult<()> {
        let result = self.run_submit_summary(summary);
        self.record(result)
    }

    fn run_submit_summary(&mut self, summary: CargoSummary) -> BookingResult<()> {
        self.require("submit_summary", CargoStep::Summary)?;
        let currency = self.current_search()?.currency();
        summary.validate(currency)?;

        let prepared = self.session.prepared.clone().ok_or_else(|| {
            BookingError::Validation("Prepare the summary before submitting it".to_string())
        })?;
        if summary.quote != prepared.quote {
            return Err(BookingError::Validation(
                "Summary does not match the prepared quote".to_string(),
            ));
        }

        self.session.summary = Some(prepared);
        self.session.step = CargoStep::Checkout;
        Ok(())
    }

    /// Create a payment intent for the summary total with a fresh reference.
    ///
    /// A new attempt is only allowed when there is no intent yet or the
    /// previous one failed.
    #[instrument(skip(self, payer), fields(payer = %payer.email))]
    pub async fn start_checkout(&mut self, payer: ContactRecord) -> BookingResult<PaymentIntent> {
        let result = self.run_start_checkout(payer).await;
        self.record(result)
    }

    async fn run_start_checkout(&mut self, payer: ContactRecord) -> BookingResult<PaymentIntent> {
        self.require("start_checkout", CargoStep::Checkout)?;
        payer.validate()?;
        if let Some(existing) = &self.session.payment {
            if existing.status != PaymentStatus::Failed {
                return Err(BookingError::Validation(format!(
                    "Payment {} is already {}",
                    existing.reference,
                    existing.status.as_str()
                )));
            }
        }
        let amount = self
            .session
            .summary
            .as_ref()
            .map(|s| s.quote.grand_total)
            .ok_or_else(|| BookingError::Internal("Session has no summary".to_string()))?;

        let request = PaymentRequest::new(amount, payer);
        let intent = self.payments.create_payment(&request).await?;
        if intent.simulated {
            warn!(reference = %intent.reference, "Checkout is using a simulated payment");
        }
        info!(payment_id = %intent.id, reference = %intent.reference, "Payment created");

        self.session.payment = Some(intent.clone());
        Ok(intent)
    }

    /// Ask the payment provider for the current status
    #[instrument(skip(self))]
    pub async fn refresh_payment_status(&mut self) -> BookingResult<PaymentStatus> {
        let result = self.run_refresh().await;
        self.record(result)
    }

    async fn run_refresh(&mut self) -> BookingResult<PaymentStatus> {
        self.require("refresh_payment_status", CargoStep::Checkout)?;
        let payment_id = self
            .session
            .payment
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or_else(|| BookingError::Validation("No payment has been started".to_string()))?;

        let status = self.payments.payment_status(&payment_id).await?;
        if let Some(payment) = self.session.payment.as_mut() {
            payment.status = status;
        }
        Ok(status)
    }

    /// Apply a status pushed by the provider (webhook or poller)
    #[instrument(skip(self))]
    pub fn apply_payment_status(&mut self, reference: &str, status: PaymentStatus) -> BookingResult<()> {
        let result = self.run_apply_status(reference, status);
        self.record(result)
    }

    fn run_apply_status(&mut self, reference: &str, status: PaymentStatus) -> BookingResult<()> {
        self.require("apply_payment_status", CargoStep::Checkout)?;
        let payment = self
            .session
            .payment
            .as_mut()
            .filter(|p| p.reference == reference)
            .ok_or_else(|| BookingError::Validation(format!("Unknown payment reference {}", reference)))?;

        info!(from = payment.status.as_str(), to = status.as_str(), "Payment status updated");
        payment.status = status;
        Ok(())
    }

    /// Confirm the booking. Only a completed payment moves past checkout.
    #[instrument(skip(self))]
    pub fn submit_payment(&mut self) -> BookingResult<()> {
        let result = self.run_submit_payment();
        self.record(result)
    }

    fn run_submit_payment(&mut self) -> BookingResult<()> {
        self.require("submit_payment", CargoStep::Checkout)?;
        match &self.session.payment {
            None => Err(BookingError::Validation(
                "No payment has been started".to_string(),
            )),
            Some(p) if p.status == PaymentStatus::Failed => Err(BookingError::Payment {
                reason: format!("Payment {} failed", p.reference),
            }),
            Some(p) if p.status != PaymentStatus::Completed => Err(BookingError::Payment {
                reason: format!("Payment {} is {}", p.reference, p.status.as_str()),
            }),
            Some(p) => {
                info!(reference = %p.reference, status = p.status.as_str(), "Cargo booking confirmed");
                self.session.step = CargoStep::Confirmation;
                Ok(())
            }
        }
    }

    /// Step back once, discarding what the left step produced.
    pub fn go_back(&mut self) -> CargoStep {
        let from = self.session.step;
        match from {
            CargoStep::Search | CargoStep::Confirmation => {}
            CargoStep::CargoDetails => self.session.search = None,
            CargoStep::ContactDetails => {
                self.session.details = None;
                self.session.total_weight_kg = None;
                self.session.total_volume = None;
            }
            CargoStep::Summary => {
                self.session.shipper = None;
                self.session.consignee = None;
                self.session.prepared = None;
            }
            CargoStep::Checkout => {
                self.session.summary = None;
                self.session.payment = None;
            }
        }
        self.session.step = from.previous();
        self.session.last_error = None;
        self.session.step
    }

    /// Discard the session and the cached settings
    pub fn reset(&mut self) {
        self.session = CargoSession::default();
        self.settings = None;
    }

    /// Drop the cached settings so the next summary reads the store again
    pub fn reload_settings(&mut self) {
        info!("Cargo settings cache cleared");
        self.settings = None;
    }

    async fn load_settings(&mut self) -> Option<CargoSettings> {
        if self.settings.is_none() {
            match self.settings_provider.load().await {
                Ok(settings) => self.settings = Some(settings),
                Err(e) => warn!(
                    provider = self.settings_provider.provider_name(),
                    error = %e,
                    "Cargo settings unavailable"
                ),
            }
        }
        self.settings.clone()
    }

    fn current_search(&self) -> BookingResult<&CargoSearch> {
        self.session
            .search
            .as_ref()
            .ok_or_else(|| BookingError::Internal("Session has no cargo search".to_string()))
    }

    fn require(&self, operation: &'static str, step: CargoStep) -> BookingResult<()> {
        if self.session.step != step {
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
