//! # aero-api
//!
//! HTTP API layer for aero-booking.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Session endpoints driving the flight and cargo booking orchestrators
//! - Fare and cargo quote endpoints
//! - The payment webhook that settles cargo checkouts
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check with provider availability |
//! | POST | `/api/v1/quotes/fare` | Fare breakdown |
//! | POST | `/api/v1/quotes/cargo` | Cargo quote |
//! | POST | `/api/v1/flights/sessions` | Start a flight booking |
//! | POST | `/api/v1/cargo/sessions` | Start a cargo booking |
//! | POST | `/api/payments/webhook` | Payment provider webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, SessionStore};
