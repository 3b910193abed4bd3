//! Cargo settings providers: the admin settings store over HTTP, a local
//! TOML file, or a fixed record.

use crate::client::{build_client, read_json, transport_error};
use crate::config::SettingsSource;
use aero_core::{BookingError, BookingResult, BoxedSettingsProvider, CargoSettings, SettingsProvider};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const SETTINGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the provider for a configured source
pub fn settings_provider(source: SettingsSource) -> BoxedSettingsProvider {
    match source {
        SettingsSource::Http { url } => Arc::new(HttpSettingsProvider::new(url)),
        SettingsSource::File(path) => Arc::new(TomlSettingsProvider::new(path)),
    }
}

/// Reads the JSON settings record from the settings store
pub struct HttpSettingsProvider {
    url: String,
    client: Client,
}

impl HttpSettingsProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: build_client(SETTINGS_TIMEOUT),
        }
    }
}

#[async_trait]
impl SettingsProvider for HttpSettingsProvider {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn load(&self) -> BookingResult<CargoSettings> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| transport_error("settings", e))?;
        let settings: CargoSettings = read_json("settings", response).await?;
        settings.cargo_fees.validate()?;
        debug!(routes = settings.cargo_route_prices.len(), "Cargo settings loaded");
        Ok(settings)
    }

    fn provider_name(&self) -> &'static str {
        "settings-http"
    }
}

/// Reads the settings record from a TOML file on every load
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsProvider for TomlSettingsProvider {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> BookingResult<CargoSettings> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BookingError::Network(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        let settings = CargoSettings::from_toml(&raw)
            .map_err(|e| BookingError::Serialization(format!("Invalid settings file: {}", e)))?;
        settings.cargo_fees.validate()?;
        Ok(settings)
    }

    fn provider_name(&self) -> &'static str {
        "settings-file"
    }
}

/// Always answers with the same record
pub struct StaticSettingsProvider {
    settings: CargoSettings,
}

impl StaticSettingsProvider {
    pub fn new(settings: CargoSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SettingsProvider for StaticSettingsProvider {
    async fn load(&self) -> BookingResult<CargoSettings> {
        Ok(self.settings.clone())
    }

    fn provider_name(&self) -> &'static str {
        "settings-static"
    }
}
