//! # Payment Status Polling
//!
//! Background polling for checkouts whose webhook may never arrive. The
//! poller publishes every observed status on a `watch` channel and stops at
//! the first terminal status, when its poll budget runs out, or when it is
//! cancelled. Dropping the poller cancels it.

use aero_core::{BoxedPaymentGateway, PaymentStatus};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_POLLS: u32 = 120;

pub struct PaymentPoller {
    payment_id: String,
    status: watch::Receiver<PaymentStatus>,
    handle: JoinHandle<()>,
}

impl PaymentPoller {
    /// Start polling `payment_id` every `interval`, at most `max_polls` times.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        gateway: BoxedPaymentGateway,
        payment_id: impl Into<String>,
        interval: Duration,
        max_polls: u32,
    ) -> Self {
        let payment_id = payment_id.into();
        let (tx, rx) = watch::channel(PaymentStatus::Pending);
        let id = payment_id.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            for poll in 1..=max_polls {
                ticker.tick().await;
                match gateway.payment_status(&id).await {
                    Ok(status) => {
                        debug!(payment_id = %id, poll, status = %status, "Polled payment status");
                        tx.send_replace(status);
                        if status.is_terminal() {
                            info!(payment_id = %id, status = %status, "Payment reached final status");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(payment_id = %id, poll, error = %e, "Payment status poll failed");
                    }
                }
            }
            warn!(payment_id = %id, max_polls, "Payment polling gave up");
        });

        Self {
            payment_id,
            status: rx,
            handle,
        }
    }

    /// Poll with the default interval and budget
    pub fn with_defaults(gateway: BoxedPaymentGateway, payment_id: impl Into<String>) -> Self {
        Self::spawn(gateway, payment_id, DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLLS)
    }

    pub fn payment_id(&self) -> &str {
        &self.payment_id
    }

    /// Last observed status
    pub fn status(&self) -> PaymentStatus {
        *self.status.borrow()
    }

    /// A receiver that sees every status change
    pub fn subscribe(&self) -> watch::Receiver<PaymentStatus> {
        self.status.clone()
    }

    /// Wait for a terminal status. Returns the last observed status if
    /// polling stops first.
    pub async fn wait(&mut self) -> PaymentStatus {
        loop {
            let current = *self.status.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.status.changed().await.is_err() {
                return *self.status.borrow();
            }
        }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PaymentPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
