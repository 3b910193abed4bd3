//! Shared reqwest plumbing: client construction and error mapping.

use aero_core::{BookingError, BookingResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

/// Client with the provider timeout applied
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// Map a transport failure to a retryable booking error
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> BookingError {
    if e.is_timeout() {
        BookingError::Timeout(format!("{} did not answer in time", provider))
    } else {
        BookingError::Network(format!("{}: {}", provider, e))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(alias = "error", alias = "detail")]
    message: String,
}

/// Read the body and parse it as `T`; non-2xx answers become `Gateway`
/// errors carrying the status.
pub(crate) async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> BookingResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;

    if !status.is_success() {
        error!(provider, status = status.as_u16(), body = %body, "Provider API error");

        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
        return Err(BookingError::gateway(provider, Some(status.as_u16()), message));
    }

    serde_json::from_str(&body).map_err(|e| {
        BookingError::Serialization(format!("Failed to parse {} response: {}", provider, e))
    })
}
