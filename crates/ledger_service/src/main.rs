// Rust guideline compliant 2026-10-19

//! Ledger service entry point.
//!
//! Wires the ledger to the system clock and the fraud heuristic, then serves
//! the HTTP API until CTRL+C.
//!
//! # Usage
//!
//! ```text
//! cargo run -p ledger_service
//! cargo run -p ledger_service -- --bind 0.0.0.0:8080 --log-format json
//! RUST_LOG=ledger=debug,tower_http=debug cargo run -p ledger_service
//! ```

mod adapters;
mod api;
mod cli;
mod logging;

use std::sync::Arc;

use adapters::system_clock::SystemClock;
use anyhow::Context as _;
use api::AppState;
use clap::Parser as _;
use fraud_heuristic::{FraudConfig, FraudHeuristic};
use ledger::{Ledger, LedgerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    // One clock shared by the ledger and the heuristic so both see the same time.
    let clock = Arc::new(SystemClock::new());

    let fraud_config = FraudConfig::builder()
        .build()
        .context("failed to build fraud heuristic config")?;
    let heuristic = FraudHeuristic::new(fraud_config, Arc::clone(&clock));

    let ledger_config = LedgerConfig::builder()
        .build()
        .context("failed to build ledger config")?;
    tracing::info!(
        max_requests = ledger_config.rate_limit.max_requests,
        window_secs = ledger_config.rate_limit.window.num_seconds(),
        transfer_limit = %ledger_config.transfer_limit,
        "main.ledger.configured"
    );
    let ledger = Ledger::new(ledger_config, clock).with_observer(heuristic);

    let router = api::create_router(AppState { ledger: Arc::new(ledger) });

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    tracing::info!(addr = %cli.bind, "main.listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("main.shutdown: complete");
    Ok(())
}

/// Resolves on CTRL+C. In-flight requests finish; all ledger state is dropped.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("main.shutdown: ctrl_c received"),
        Err(e) => tracing::error!(error = %e, "main.shutdown: failed to listen for ctrl_c"),
    }
}
