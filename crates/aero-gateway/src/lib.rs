//! # aero-gateway
//!
//! Provider clients for aero-booking.
//!
//! This crate provides the HTTP implementations of the `aero-core`
//! collaborator traits:
//!
//! 1. **HttpTicketingGateway** - flight search, PNR and ticketing (JSON API)
//! 2. **HttpPaymentGateway** - hosted payment requests (form API) with
//!    HMAC-signed webhooks
//! 3. **HttpSettingsProvider / TomlSettingsProvider** - the cargo settings record
//!
//! Wrappers add the degraded mode: `FallbackTicketingGateway` serves a mock
//! flight when search fails, `FallbackPaymentGateway` simulates a payment
//! outside production. `UnavailableGateway` stands in for a provider whose
//! credentials are missing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aero_gateway::{FallbackTicketingGateway, HttpTicketingGateway};
//! use std::sync::Arc;
//!
//! let ticketing = Arc::new(FallbackTicketingGateway::new(Arc::new(HttpTicketingGateway::from_env()?)));
//! let mut booking = FlightBookingOrchestrator::new(ticketing);
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use aero_gateway::webhook::{dispatch_webhook_event, LoggingWebhookHandler};
//!
//! let payload = payments.verify_webhook(&body, signature)?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &payload)?;
//! ```

mod client;
pub mod config;
pub mod fallback;
pub mod payment;
pub mod poller;
pub mod retry;
pub mod settings;
pub mod ticketing;
pub mod unavailable;
pub mod webhook;

pub use config::{PaymentConfig, SettingsSource, TicketingConfig, DEFAULT_SIMULATION_DELAY};
pub use fallback::{FallbackPaymentGateway, FallbackTicketingGateway};
pub use payment::HttpPaymentGateway;
pub use poller::PaymentPoller;
pub use retry::RetryPolicy;
pub use settings::{settings_provider, HttpSettingsProvider, StaticSettingsProvider, TomlSettingsProvider};
pub use ticketing::HttpTicketingGateway;
pub use unavailable::UnavailableGateway;
pub use webhook::{dispatch_webhook_event, LoggingWebhookHandler, WebhookHandler};
