// Rust guideline compliant 2026-10-19

//! Advisory fraud heuristic.
//!
//! [`FraudHeuristic`] flags transfer velocity above a per-minute threshold and
//! withdrawals at or above a size threshold. It implements the
//! `domain::FraudObserver` port; flags are signals only and never stop the
//! mutation that produced them.
//!
//! Entry points: [`FraudHeuristic::observe_transfer`],
//! [`FraudHeuristic::observe_withdrawal`]. Configuration via
//! [`FraudConfig::builder`].

use std::collections::HashMap;

use chrono::TimeDelta;
use domain::{Amount, Clock, FraudFlag, FraudObserver, UserId};
use parking_lot::Mutex;
use rate_limiter::SlidingWindow;
use rust_decimal::Decimal;

/// Transfers per window above which a user is flagged.
pub const DEFAULT_MAX_TRANSFERS: usize = 5;

/// Withdrawals at or above this amount are flagged.
pub const DEFAULT_LARGE_WITHDRAWAL: i64 = 10_000;

/// Velocity window length in seconds.
pub const DEFAULT_VELOCITY_WINDOW_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// FraudConfigError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`FraudHeuristic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FraudConfigError {
    /// The supplied configuration is invalid.
    #[error("invalid fraud heuristic configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// FraudConfig + builder
// ---------------------------------------------------------------------------

/// Thresholds for a [`FraudHeuristic`].
///
/// Construct via [`FraudConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudConfig {
    /// A user is flagged once strictly more than this many transfers fall
    /// inside `velocity_window`.
    pub max_transfers: usize,
    /// Trailing window for transfer velocity.
    pub velocity_window: TimeDelta,
    /// Withdrawals `>=` this amount are flagged.
    pub large_withdrawal: Amount,
}

/// Builder for [`FraudConfig`].
#[derive(Debug)]
pub struct FraudConfigBuilder {
    max_transfers: usize,
    velocity_window: TimeDelta,
    large_withdrawal: Amount,
}

impl FraudConfig {
    /// Create a builder.
    ///
    /// Default values: `max_transfers = 5`, `velocity_window = 60 s`,
    /// `large_withdrawal = 10000`.
    #[must_use]
    pub fn builder() -> FraudConfigBuilder {
        FraudConfigBuilder {
            max_transfers: DEFAULT_MAX_TRANSFERS,
            velocity_window: TimeDelta::seconds(DEFAULT_VELOCITY_WINDOW_SECS),
            large_withdrawal: Decimal::from(DEFAULT_LARGE_WITHDRAWAL),
        }
    }
}

impl FraudConfigBuilder {
    /// Override the transfer velocity threshold.
    #[must_use]
    pub fn max_transfers(mut self, max_transfers: usize) -> Self {
        self.max_transfers = max_transfers;
        self
    }

    /// Override the velocity window.
    #[must_use]
    pub fn velocity_window(mut self, window: TimeDelta) -> Self {
        self.velocity_window = window;
        self
    }

    /// Override the large-withdrawal threshold.
    #[must_use]
    pub fn large_withdrawal(mut self, threshold: Amount) -> Self {
        self.large_withdrawal = threshold;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FraudConfigError::InvalidConfig`] when the window or the
    /// withdrawal threshold is not strictly positive.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<FraudConfig, FraudConfigError> {
        if self.velocity_window <= TimeDelta::zero() {
            return Err(FraudConfigError::InvalidConfig {
                reason: "velocity_window must be > 0".to_owned(),
            });
        }
        if self.large_withdrawal <= Decimal::ZERO {
            return Err(FraudConfigError::InvalidConfig {
                reason: "large_withdrawal must be > 0".to_owned(),
            });
        }
        Ok(FraudConfig {
            max_transfers: self.max_transfers,
            velocity_window: self.velocity_window,
            large_withdrawal: self.large_withdrawal,
        })
    }
}

// ---------------------------------------------------------------------------
// FraudHeuristic
// ---------------------------------------------------------------------------

/// Velocity and size heuristic over transfers and withdrawals.
///
/// Keeps its own per-user transfer log, independent of the ledger's request
/// rate windows, behind its own lock.
#[derive(Debug)]
pub struct FraudHeuristic<C: Clock> {
    config: FraudConfig,
    clock: C,
    transfer_logs: Mutex<HashMap<UserId, SlidingWindow>>,
}

impl<C: Clock> FraudHeuristic<C> {
    /// Create a heuristic with empty transfer logs.
    #[must_use]
    pub fn new(config: FraudConfig, clock: C) -> Self {
        Self { config, clock, transfer_logs: Mutex::new(HashMap::new()) }
    }

    /// Active thresholds.
    #[must_use]
    pub fn config(&self) -> &FraudConfig {
        &self.config
    }

    /// Log a transfer by `user_id` and flag it if the user's velocity is too high.
    ///
    /// The transfer is always logged, flagged or not. `_amount` does not feed
    /// the velocity rule; it is accepted so callers report the full event.
    pub fn observe_transfer(&self, user_id: UserId, _amount: Amount) -> Option<FraudFlag> {
        let now = self.clock.now();
        let count = {
            let mut logs = self.transfer_logs.lock();
            let log = logs.entry(user_id).or_default();
            log.record(now);
            log.prune(now, self.config.velocity_window);
            log.len()
        };

        (count > self.config.max_transfers).then(|| {
            tracing::warn!(%user_id, count, "fraud.transfer.flagged: too many transfers in window");
            FraudFlag::RateLimitExceeded
        })
    }

    /// Flag a withdrawal of `amount` at or above the large-withdrawal threshold.
    #[must_use]
    pub fn observe_withdrawal(&self, amount: Amount) -> Option<FraudFlag> {
        (amount >= self.config.large_withdrawal).then(|| {
            tracing::warn!(%amount, "fraud.withdrawal.flagged: large withdrawal");
            FraudFlag::LargeWithdrawal
        })
    }

    /// Number of transfers currently held for `user_id` as of its last observation.
    #[must_use]
    pub fn transfers_in_window(&self, user_id: UserId) -> usize {
        self.transfer_logs.lock().get(&user_id).map_or(0, SlidingWindow::len)
    }
}

impl<C: Clock> FraudObserver for FraudHeuristic<C> {
    fn on_transfer(&self, sender: UserId, recipient: UserId, amount: Amount) -> Option<FraudFlag> {
        tracing::debug!(%sender, %recipient, %amount, "fraud.observe_transfer");
        self.observe_transfer(sender, amount)
    }

    fn on_withdrawal(&self, user_id: UserId, amount: Amount) -> Option<FraudFlag> {
        tracing::debug!(%user_id, %amount, "fraud.observe_withdrawal");
        self.observe_withdrawal(amount)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
