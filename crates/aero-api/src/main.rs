//! # aero-booking
//!
//! Flight and cargo booking service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export TICKETING_API_URL=https://ticketing.example/api
//! export TICKETING_API_KEY=...
//! export PAYMENT_API_URL=https://payments.example/v1
//! export PAYMENT_API_KEY=...
//! export PAYMENT_WEBHOOK_SECRET=...
//!
//! # Run the server
//! aero-booking
//! ```
//!
//! Providers without credentials are disabled and reported by `/health`.

use aero_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::from_env();

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    for provider in state.providers().await {
        info!(provider = provider.name, available = provider.available, "Provider status");
    }

    if let Some(ttl) = state.config.session_ttl {
        info!(ttl_secs = ttl.as_secs(), "Idle sessions expire");
    }
    state.spawn_session_sweeper();

    let app = routes::create_router(state);

    info!("aero-booking starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Flight sessions: POST http://{}/api/v1/flights/sessions", addr);
        info!("Cargo sessions: POST http://{}/api/v1/cargo/sessions", addr);
        info!("Webhook: POST http://{}/api/payments/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  aero-booking
  ━━━━━━━━━━━━━━━━━━━━━━━
  Flights and air cargo
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
