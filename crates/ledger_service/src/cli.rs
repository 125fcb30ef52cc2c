// Rust guideline compliant 2026-10-19

//! Command-line arguments for `ledger_service`.

use std::net::SocketAddr;

use clap::Parser;

use crate::logging::LogFormat;

/// In-memory ledger HTTP service.
///
/// Serves register, deposit, withdraw, transfer, balance and history
/// endpoints. All state is lost when the process exits.
#[derive(Parser, Debug)]
#[command(name = "ledger_service", version)]
pub struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "LEDGER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "LEDGER_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}
