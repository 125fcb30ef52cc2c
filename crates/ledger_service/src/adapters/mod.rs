// Rust guideline compliant 2026-10-19

//! Adapters (secondary ports) for the ledger service binary.
//!
//! Each sub-module implements a hexagonal port trait defined in the `domain`
//! crate. Adapters stay outside the domain and ledger crates.

pub mod system_clock;
