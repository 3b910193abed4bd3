//! # Payment Types
//!
//! Payment intents created at cargo checkout and the webhook payload the
//! payment provider posts back. Wire names are snake_case.

use crate::money::Money;
use crate::passenger::ContactRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a payment intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Maps provider status strings. Unknown values stay pending.
    pub fn from_provider(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "paid" | "succeeded" => PaymentStatus::Completed,
            "failed" | "expired" | "cancelled" | "canceled" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fresh reference for one payment attempt
pub fn new_payment_reference() -> String {
    format!("AERO-{}", Uuid::new_v4().simple())
}

/// What checkout asks the provider to charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub payer: ContactRecord,
    /// Unique per attempt
    pub reference: String,
}

impl PaymentRequest {
    pub fn new(amount: Money, payer: ContactRecord) -> Self {
        Self {
            amount,
            payer,
            reference: new_payment_reference(),
        }
    }
}

/// A payment intent as tracked by the booking flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider-side id
    pub id: String,
    pub reference: String,
    pub amount: Money,
    pub payer: ContactRecord,
    pub status: PaymentStatus,
    /// Hosted payment page, absent for simulated payments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    /// Created by the non-production fallback, not the provider
    #[serde(default)]
    pub simulated: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

/// Webhook body posted by the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment_id: String,
    pub payment_request_id: String,
    #[serde(default)]
    pub phone: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub reference_number: String,
    #[serde(default)]
    pub hmac: String,
}

impl WebhookPayload {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_provider(&self.status)
    }
}
