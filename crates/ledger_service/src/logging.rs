// Rust guideline compliant 2026-10-19

//! Structured logging setup.
//!
//! Initializes the `tracing` subscriber with an `EnvFilter` and either a
//! human-readable or a JSON `fmt` layer. `RUST_LOG`, when set, overrides the
//! level passed on the command line.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for local runs.
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Initialize the global tracing subscriber. Call exactly once, early in `main`.
///
/// `default_level` accepts any `EnvFilter` directive, e.g. `"info"` or
/// `"ledger=debug,tower_http=debug"`.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(true))
                .init();
        }
    }

    tracing::info!(?format, "logging.initialized");
}
