//! # Booking Error Types
//!
//! Typed error handling for the booking engine.
//! Every orchestrator transition and collaborator call returns
//! `Result<T, BookingError>`.

use thiserror::Error;

/// Broad error class, used by callers that only need to know how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Route,
    Gateway,
    Network,
    Configuration,
    Payment,
    Webhook,
    Session,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Route => "route",
            ErrorKind::Gateway => "gateway",
            ErrorKind::Network => "network",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Payment => "payment",
            ErrorKind::Webhook => "webhook",
            ErrorKind::Session => "session",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Core error type for booking, pricing and provider operations
#[derive(Debug, Error)]
pub enum BookingError {
    /// Bad input shape or range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unsupported origin/destination or schedule mismatch
    #[error("Route error: {0}")]
    Route(String),

    /// Provider answered with a non-2xx status or a fault body
    #[error("Provider error [{provider}]: {message}")]
    Gateway {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Connectivity failure talking to a provider
    #[error("Network error: {0}")]
    Network(String),

    /// Provider did not answer in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Missing or malformed provider credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider rejected the payment
    #[error("Payment rejected: {reason}")]
    Payment { reason: String },

    /// Webhook signature did not match
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook body could not be parsed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Operation called from the wrong workflow step
    #[error("Invalid step: {operation} requires step {expected}, session is at step {actual}")]
    InvalidStep {
        operation: &'static str,
        expected: u8,
        actual: u8,
    },

    /// Booking session unknown or already discarded
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Shorthand for a provider fault carrying an HTTP status
    pub fn gateway(provider: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        BookingError::Gateway {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns true for transient faults: timeouts, network errors and
    /// provider answers 429/503/504. Validation and auth failures never retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BookingError::Network(_) | BookingError::Timeout(_) => true,
            BookingError::Gateway { status, .. } => matches!(status, Some(429 | 503 | 504)),
            _ => false,
        }
    }

    /// Returns the broad class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) | BookingError::Serialization(_) => ErrorKind::Validation,
            BookingError::Route(_) => ErrorKind::Route,
            BookingError::Gateway { .. } => ErrorKind::Gateway,
            BookingError::Network(_) | BookingError::Timeout(_) => ErrorKind::Network,
            BookingError::Configuration(_) => ErrorKind::Configuration,
            BookingError::Payment { .. } => ErrorKind::Payment,
            BookingError::WebhookVerificationFailed(_) | BookingError::WebhookParse(_) => {
                ErrorKind::Webhook
            }
            BookingError::InvalidStep { .. } | BookingError::SessionNotFound { .. } => {
                ErrorKind::Session
            }
            BookingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 400,
            BookingError::Route(_) => 422,
            BookingError::Gateway { .. } => 502,
            BookingError::Network(_) => 503,
            BookingError::Timeout(_) => 504,
            BookingError::Configuration(_) => 503,
            BookingError::Payment { .. } => 402,
            BookingError::WebhookVerificationFailed(_) => 401,
            BookingError::WebhookParse(_) => 400,
            BookingError::InvalidStep { .. } => 409,
            BookingError::SessionNotFound { .. } => 404,
            BookingError::Serialization(_) => 400,
            BookingError::Internal(_) => 500,
        }
    }
}

/// Result type alias for booking operations
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(BookingError::Network("reset".into()).is_retryable());
        assert!(BookingError::Timeout("search".into()).is_retryable());
        assert!(BookingError::gateway("ticketing", Some(429), "slow down").is_retryable());
        assert!(BookingError::gateway("ticketing", Some(503), "maintenance").is_retryable());
        assert!(BookingError::gateway("ticketing", Some(504), "upstream").is_retryable());

        assert!(!BookingError::gateway("ticketing", Some(500), "boom").is_retryable());
        assert!(!BookingError::gateway("ticketing", Some(401), "bad key").is_retryable());
        assert!(!BookingError::Validation("bad data".into()).is_retryable());
        assert!(!BookingError::Configuration("no key".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(BookingError::Validation("x".into()).status_code(), 400);
        assert_eq!(BookingError::Route("x".into()).status_code(), 422);
        assert_eq!(
            BookingError::InvalidStep {
                operation: "process_payment",
                expected: 4,
                actual: 2
            }
            .status_code(),
            409
        );
        assert_eq!(
            BookingError::WebhookVerificationFailed("mismatch".into()).status_code(),
            401
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(BookingError::Timeout("t".into()).kind(), ErrorKind::Network);
        assert_eq!(
            BookingError::Payment { reason: "declined".into() }.kind(),
            ErrorKind::Payment
        );
    }
}
