//! # Application State
//!
//! Shared state for the Axum application: the provider gateways, the
//! in-flight booking sessions and configuration.

use aero_core::{
    BookingError, BookingResult, BoxedPaymentGateway, BoxedSettingsProvider, BoxedTicketingGateway,
    CargoBookingOrchestrator, FlightBookingOrchestrator,
};
use aero_gateway::{
    settings_provider, FallbackPaymentGateway, FallbackTicketingGateway, HttpPaymentGateway,
    HttpTicketingGateway, LoggingWebhookHandler, PaymentConfig, SettingsSource, UnavailableGateway,
    WebhookHandler, DEFAULT_SIMULATION_DELAY,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_POLL_SECS: u64 = 5;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL used for payment redirects and webhooks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Interval for background payment polling; `None` disables it
    pub payment_poll_interval: Option<Duration>,
    /// Idle time after which an unfinished session is evicted; `None` keeps them
    pub session_ttl: Option<Duration>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let poll_secs = std::env::var("PAYMENT_POLL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_SECS);
        let ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            payment_poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
            session_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
        }
    }

    /// Config for tests: no polling, no eviction, development environment
    pub fn local() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: "development".to_string(),
            payment_poll_interval: None,
            session_ttl: None,
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

struct Entry<T> {
    session: Arc<Mutex<T>>,
    touched: Instant,
}

/// Sessions keyed by id, each behind its own async mutex so one session
/// runs one transition at a time.
pub struct SessionStore<T> {
    sessions: Arc<RwLock<HashMap<Uuid, Entry<T>>>>,
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
        }
    }
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> SessionStore<T> {
    pub async fn insert(&self, value: T) -> (Uuid, Arc<Mutex<T>>) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(value));
        self.sessions.write().await.insert(
            id,
            Entry {
                session: session.clone(),
                touched: Instant::now(),
            },
        );
        (id, session)
    }

    /// Fetch a session and mark it as used
    pub async fn get(&self, id: Uuid) -> BookingResult<Arc<Mutex<T>>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| BookingError::SessionNotFound {
            session_id: id.to_string(),
        })?;
        entry.touched = Instant::now();
        Ok(entry.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions untouched for longer than `ttl`, returning their ids
    pub async fn evict_idle(&self, ttl: Duration) -> Vec<Uuid> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let idle: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.touched) > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &idle {
            sessions.remove(id);
        }
        idle
    }
}

/// Availability of one provider, as reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: &'static str,
    pub available: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ticketing: BoxedTicketingGateway,
    pub payments: BoxedPaymentGateway,
    pub settings: BoxedSettingsProvider,
    pub flights: SessionStore<FlightBookingOrchestrator>,
    pub cargo: SessionStore<CargoBookingOrchestrator>,
    /// Payment reference to the cargo session that created it
    pub payment_refs: Arc<RwLock<HashMap<String, Uuid>>>,
    pub webhook_handler: Arc<dyn WebhookHandler>,
    pub config: AppConfig,
}

impl AppState {
    /// Build from environment variables.
    ///
    /// A provider with missing credentials is replaced by an
    /// `UnavailableGateway` and reported by `/health`; startup never fails
    /// on it.
    pub fn from_env() -> Self {
        let config = AppConfig::from_env();

        let ticketing: BoxedTicketingGateway = match HttpTicketingGateway::from_env() {
            Ok(gateway) => Arc::new(FallbackTicketingGateway::new(Arc::new(gateway))),
            Err(e) => {
                warn!(error = %e, "Ticketing provider disabled");
                Arc::new(FallbackTicketingGateway::new(Arc::new(UnavailableGateway::new(
                    "ticketing",
                    e.to_string(),
                ))))
            }
        };

        let payments: BoxedPaymentGateway = match PaymentConfig::from_env() {
            Ok(payment_config) => {
                let allow = payment_config.allow_simulation;
                let delay = payment_config.simulation_delay;
                Arc::new(FallbackPaymentGateway::new(
                    Arc::new(HttpPaymentGateway::new(payment_config)),
                    allow,
                    delay,
                ))
            }
            Err(e) => {
                warn!(error = %e, "Payment provider disabled");
                Arc::new(FallbackPaymentGateway::new(
                    Arc::new(UnavailableGateway::new("payment", e.to_string())),
                    !config.is_production(),
                    DEFAULT_SIMULATION_DELAY,
                ))
            }
        };

        let source = SettingsSource::from_env();
        info!(source = ?source, "Cargo settings source");

        Self::new(config, ticketing, payments, settings_provider(source))
    }

    /// Build with explicit collaborators
    pub fn new(
        config: AppConfig,
        ticketing: BoxedTicketingGateway,
        payments: BoxedPaymentGateway,
        settings: BoxedSettingsProvider,
    ) -> Self {
        Self {
            ticketing,
            payments,
            settings,
            flights: SessionStore::default(),
            cargo: SessionStore::default(),
            payment_refs: Arc::new(RwLock::new(HashMap::new())),
            webhook_handler: Arc::new(LoggingWebhookHandler),
            config,
        }
    }

    pub fn with_webhook_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.webhook_handler = handler;
        self
    }

    pub fn new_flight_booking(&self) -> FlightBookingOrchestrator {
        FlightBookingOrchestrator::new(self.ticketing.clone())
    }

    pub fn new_cargo_booking(&self) -> CargoBookingOrchestrator {
        CargoBookingOrchestrator::new(self.settings.clone(), self.payments.clone())
    }

    /// Provider availability. The settings source is checked with a load.
    pub async fn providers(&self) -> Vec<ProviderStatus> {
        vec![
            ProviderStatus {
                name: self.ticketing.provider_name(),
                available: self.ticketing.is_available(),
            },
            ProviderStatus {
                name: self.payments.provider_name(),
                available: self.payments.is_available(),
            },
            ProviderStatus {
                name: self.settings.provider_name(),
                available: self.settings.load().await.is_ok(),
            },
        ]
    }

    /// Remember which cargo session owns a payment reference
    pub async fn track_payment(&self, reference: &str, session_id: Uuid) {
        self.payment_refs
            .write()
            .await
            .insert(reference.to_string(), session_id);
    }

    pub async fn session_for_payment(&self, reference: &str) -> Option<Uuid> {
        self.payment_refs.read().await.get(reference).copied()
    }

    /// Drop every payment reference owned by a cargo session
    pub async fn forget_payments(&self, session_id: Uuid) {
        self.payment_refs.write().await.retain(|_, owner| *owner != session_id);
    }

    /// Remove a cargo session together with its payment references
    pub async fn close_cargo_session(&self, session_id: Uuid) -> bool {
        let removed = self.cargo.remove(session_id).await;
        self.forget_payments(session_id).await;
        removed
    }

    /// Evict idle flight and cargo sessions once
    pub async fn evict_idle_sessions(&self, ttl: Duration) -> usize {
        let flights = self.flights.evict_idle(ttl).await;
        let cargo = self.cargo.evict_idle(ttl).await;
        for id in &cargo {
            self.forget_payments(*id).await;
        }
        let evicted = flights.len() + cargo.len();
        if evicted > 0 {
            info!(flights = flights.len(), cargo = cargo.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Sweep idle sessions in the background when a TTL is configured
    pub fn spawn_session_sweeper(&self) -> Option<JoinHandle<()>> {
        let ttl = self.config.session_ttl?;
        let state = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                state.evict_idle_sessions(ttl).await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aero_core::memory::{InMemoryPaymentGateway, InMemorySettingsProvider, InMemoryTicketingGateway};

    fn state() -> AppState {
        AppState::new(
            AppConfig::local(),
            Arc::new(InMemoryTicketingGateway::default()),
            Arc::new(InMemoryPaymentGateway::new()),
            Arc::new(InMemorySettingsProvider::unavailable()),
        )
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::local()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
        assert!(!config.is_production());
    }

    #[test]
    fn test_invalid_socket_addr() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::local()
        };
        assert!(config.socket_addr().is_err());
    }

    #[tokio::test]
    async fn test_session_store() {
        let store: SessionStore<u32> = SessionStore::default();
        let (id, _) = store.insert(7).await;

        assert_eq!(*store.get(id).await.unwrap().lock().await, 7);
        assert!(store.remove(id).await);
        assert!(matches!(
            store.get(id).await,
            Err(BookingError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_providers_report_unreachable_settings() {
        let providers = state().providers().await;
        assert!(providers[0].available);
        assert!(providers[1].available);
        assert!(!providers[2].available);
    }

    #[tokio::test]
    async fn test_payment_tracking() {
        let state = state();
        let id = Uuid::new_v4();
        state.track_payment("AERO-1", id).await;

        assert_eq!(state.session_for_payment("AERO-1").await, Some(id));
        assert_eq!(state.session_for_payment("AERO-2").await, None);
    }

    #[tokio::test]
    async fn test_close_cargo_session_forgets_payments() {
        let state = state();
        let (id, _) = state.cargo.insert(state.new_cargo_booking()).await;
        let other = Uuid::new_v4();
        state.track_payment("AERO-1", id).await;
        state.track_payment("AERO-2", id).await;
        state.track_payment("AERO-3", other).await;

        assert!(state.close_cargo_session(id).await);
        assert_eq!(state.cargo.len().await, 0);
        assert_eq!(state.session_for_payment("AERO-1").await, None);
        assert_eq!(state.session_for_payment("AERO-2").await, None);
        assert_eq!(state.session_for_payment("AERO-3").await, Some(other));
        assert!(!state.close_cargo_session(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted() {
        let state = state();
        let (idle_flight, _) = state.flights.insert(state.new_flight_booking()).await;
        let (idle_cargo, _) = state.cargo.insert(state.new_cargo_booking()).await;
        let (active, _) = state.cargo.insert(state.new_cargo_booking()).await;
        state.track_payment("AERO-1", idle_cargo).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        state.cargo.get(active).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(state.evict_idle_sessions(Duration::from_secs(60)).await, 2);
        assert!(state.flights.get(idle_flight).await.is_err());
        assert!(state.cargo.get(idle_cargo).await.is_err());
        assert!(state.cargo.get(active).await.is_ok());
        assert_eq!(state.session_for_payment("AERO-1").await, None);
    }

    #[test]
    fn test_local_config_keeps_sessions() {
        assert_eq!(AppConfig::local().session_ttl, None);
        assert!(state().spawn_session_sweeper().is_none());
    }
}
