//! # Provider Configuration
//!
//! Configuration for the ticketing, payment and settings providers.
//! All secrets are loaded from environment variables.

use crate::retry::RetryPolicy;
use aero_core::BookingError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Delay before a simulated payment completes
pub const DEFAULT_SIMULATION_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_SETTINGS_FILE: &str = "config/cargo_settings.toml";

fn required(name: &str) -> Result<String, BookingError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BookingError::Configuration(format!("{} not set", name)))
}

fn timeout_from_env(name: &str) -> Result<Duration, BookingError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| BookingError::Configuration(format!("{} must be a number of seconds", name))),
        Err(_) => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
    }
}

/// Ticketing provider configuration
#[derive(Debug, Clone)]
pub struct TicketingConfig {
    /// API base URL, without trailing slash
    pub api_base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl TicketingConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `TICKETING_API_URL`
    /// - `TICKETING_API_KEY`
    ///
    /// Optional: `TICKETING_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self, BookingError> {
        dotenvy::dotenv().ok();

        let api_base_url = required("TICKETING_API_URL")?;
        let api_key = required("TICKETING_API_KEY")?;
        let timeout = timeout_from_env("TICKETING_TIMEOUT_SECS")?;

        Ok(Self::new(api_base_url, api_key).with_timeout(timeout))
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

/// Payment provider configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_base_url: String,
    /// Business API key header value
    pub api_key: String,
    /// Optional bearer token some provider accounts require
    pub auth_token: Option<String>,
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: String,
    pub redirect_url: String,
    pub webhook_url: String,
    pub cancel_url: String,
    /// Fall back to a simulated payment when creation fails (never in production)
    pub allow_simulation: bool,
    pub simulation_delay: Duration,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl PaymentConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYMENT_API_URL`
    /// - `PAYMENT_API_KEY`
    /// - `PAYMENT_WEBHOOK_SECRET`
    ///
    /// Optional: `PAYMENT_AUTH_TOKEN`. Redirect, webhook and cancel URLs
    /// are derived from `BASE_URL`; `ENVIRONMENT=production` disables
    /// payment simulation.
    pub fn from_env() -> Result<Self, BookingError> {
        dotenvy::dotenv().ok();

        let api_base_url = required("PAYMENT_API_URL")?;
        let api_key = required("PAYMENT_API_KEY")?;
        let webhook_secret = required("PAYMENT_WEBHOOK_SECRET")?;
        let auth_token = env::var("PAYMENT_AUTH_TOKEN").ok().filter(|t| !t.trim().is_empty());

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let production = env::var("ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let mut config = Self::new(api_base_url, api_key, webhook_secret)
            .with_public_base_url(&base_url)
            .with_simulation(!production);
        config.auth_token = auth_token;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        api_base_url: impl Into<String>,
        api_key: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            auth_token: None,
            webhook_secret: webhook_secret.into(),
            redirect_url: String::new(),
            webhook_url: String::new(),
            cancel_url: String::new(),
            allow_simulation: false,
            simulation_delay: DEFAULT_SIMULATION_DELAY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
        .with_public_base_url("http://localhost:3000")
    }

    /// Derive redirect, webhook and cancel URLs from the public base URL
    pub fn with_public_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.redirect_url = format!("{}/cargo/payment/complete", base);
        self.webhook_url = format!("{}/api/payments/webhook", base);
        self.cancel_url = format!("{}/cargo/payment/cancel", base);
        self
    }

    pub fn with_simulation(mut self, allow: bool) -> Self {
        self.allow_simulation = allow;
        self
    }

    pub fn with_simulation_delay(mut self, delay: Duration) -> Self {
        self.simulation_delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

/// Where the cargo settings record is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    /// Settings store endpoint returning the JSON record
    Http { url: String },
    /// Local TOML file
    File(PathBuf),
}

impl SettingsSource {
    /// `SETTINGS_API_URL` if set, otherwise `SETTINGS_FILE` or the default
    /// `config/cargo_settings.toml`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        match env::var("SETTINGS_API_URL") {
            Ok(url) if !url.trim().is_empty() => SettingsSource::Http { url },
            _ => SettingsSource::File(
                env::var("SETTINGS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticketing_endpoints() {
        let config = TicketingConfig::new("https://api.ticketing.test/v2/", "key_123");
        assert_eq!(config.endpoint("/search"), "https://api.ticketing.test/v2/search");
        assert_eq!(config.auth_header(), "Bearer key_123");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_payment_urls_from_base() {
        let config = PaymentConfig::new("https://pay.test", "k", "s").with_public_base_url("https://aero.tl/");
        assert_eq!(config.webhook_url, "https://aero.tl/api/payments/webhook");
        assert_eq!(config.redirect_url, "https://aero.tl/cargo/payment/complete");
        assert_eq!(config.cancel_url, "https://aero.tl/cargo/payment/cancel");
        assert!(!config.allow_simulation);
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("TICKETING_API_KEY");
        assert!(matches!(
            TicketingConfig::from_env(),
            Err(BookingError::Configuration(_))
        ));
    }
}
