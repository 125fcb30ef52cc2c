// Rust guideline compliant 2026-10-19

//! Per-identity sliding-window rate limiter.
//!
//! Entry points: [`RateLimiter::check`], [`RateLimiter::is_limited`],
//! [`RateLimiter::record`]. Configuration via [`RateLimiterConfig::builder`].
//! [`SlidingWindow`] is public so other components (e.g. the fraud heuristic)
//! can reuse the same pruning policy with their own thresholds.
//!
//! The limiter is a plain `&mut self` structure. Callers that share it across
//! threads own the lock; a single `&mut` call is the atomic step.

use std::collections::{HashMap, VecDeque};

use chrono::TimeDelta;
use domain::{Timestamp, UserId};

/// Requests admitted per user per window when not overridden.
pub const DEFAULT_MAX_REQUESTS: usize = 10;

/// Window length in seconds when not overridden.
pub const DEFAULT_WINDOW_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// RateLimiterError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`RateLimiter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimiterError {
    /// The supplied configuration is invalid.
    #[error("invalid rate limiter configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// RateLimiterConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`RateLimiter`].
///
/// Construct via [`RateLimiterConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of admitted requests inside one window (>= 1).
    pub max_requests: usize,
    /// Trailing window length (> 0).
    pub window: TimeDelta,
}

/// Builder for [`RateLimiterConfig`].
///
/// Obtain via [`RateLimiterConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct RateLimiterConfigBuilder {
    max_requests: usize,
    window: TimeDelta,
}

impl RateLimiterConfig {
    /// Create a builder.
    ///
    /// Default values: `max_requests = 10`, `window = 60 s`.
    #[must_use]
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: TimeDelta::seconds(DEFAULT_WINDOW_SECS),
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: TimeDelta::seconds(DEFAULT_WINDOW_SECS),
        }
    }
}

impl RateLimiterConfigBuilder {
    /// Override the per-window request cap.
    #[must_use]
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Override the window length.
    #[must_use]
    pub fn window(mut self, window: TimeDelta) -> Self {
        self.window = window;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimiterError::InvalidConfig`] when `max_requests` is zero
    /// or `window` is not strictly positive.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<RateLimiterConfig, RateLimiterError> {
        if self.max_requests == 0 {
            return Err(RateLimiterError::InvalidConfig {
                reason: "max_requests must be >= 1".to_owned(),
            });
        }
        if self.window <= TimeDelta::zero() {
            return Err(RateLimiterError::InvalidConfig {
                reason: "window must be > 0".to_owned(),
            });
        }
        Ok(RateLimiterConfig { max_requests: self.max_requests, window: self.window })
    }
}

// ---------------------------------------------------------------------------
// SlidingWindow
// ---------------------------------------------------------------------------

/// Ordered timestamps of recent events for one identity.
///
/// An entry at `t` survives [`prune`](Self::prune) iff `now - t < length`;
/// an entry exactly `length` old is dropped.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    stamps: VecDeque<Timestamp>,
}

impl SlidingWindow {
    /// Create an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry that is `length` old or older at `now`.
    pub fn prune(&mut self, now: Timestamp, length: TimeDelta) {
        // retain, not pop_front: a clock step backwards may leave entries out of order.
        self.stamps.retain(|t| now - *t < length);
    }

    /// Append an event time.
    pub fn record(&mut self, at: Timestamp) {
        self.stamps.push_back(at);
    }

    /// Number of entries currently held (pruned or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// `true` when no entry is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request was admitted and recorded.
    Allowed,
    /// The window is full; nothing was recorded.
    Limited,
}

/// Sliding-window request counter keyed by [`UserId`].
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    windows: HashMap<UserId, SlidingWindow>,
}

impl RateLimiter {
    /// Create a limiter with no recorded requests.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        Self { config, windows: HashMap::new() }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Prune, test and, if admitted, record `now` for `user_id` in one step.
    pub fn check(&mut self, user_id: UserId, now: Timestamp) -> RateDecision {
        if self.is_limited(user_id, now) {
            return RateDecision::Limited;
        }
        self.record(user_id, now);
        RateDecision::Allowed
    }

    /// Prune `user_id`'s window and report whether it is full. Records nothing.
    pub fn is_limited(&mut self, user_id: UserId, now: Timestamp) -> bool {
        let Some(window) = self.windows.get_mut(&user_id) else {
            return false;
        };
        window.prune(now, self.config.window);
        let count = window.len();
        if window.is_empty() {
            self.windows.remove(&user_id);
        }
        let limited = count >= self.config.max_requests;
        if limited {
            tracing::debug!(%user_id, count, "rate_limiter.limited");
        }
        limited
    }

    /// Record an admitted request for `user_id` at `at`.
    pub fn record(&mut self, user_id: UserId, at: Timestamp) {
        self.windows.entry(user_id).or_default().record(at);
    }

    /// Number of requests held for `user_id` as of the last prune.
    #[must_use]
    pub fn requests_in_window(&self, user_id: UserId) -> usize {
        self.windows.get(&user_id).map_or(0, SlidingWindow::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t0() -> Timestamp {
        DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap()
    }

    fn secs(n: i64) -> TimeDelta {
        TimeDelta::seconds(n)
    }

    fn default_limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig::builder().build().unwrap())
    }

    // ------------------------------------------------------------------
    // Config
    // ------------------------------------------------------------------

    #[test]
    fn builder_defaults() {
        let config = RateLimiterConfig::builder().build().unwrap();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window, secs(60));
        assert_eq!(config, RateLimiterConfig::default());
    }

    #[test]
    fn config_rejects_zero_max_requests() {
        let result = RateLimiterConfig::builder().max_requests(0).build();
        assert!(matches!(result, Err(RateLimiterError::InvalidConfig { .. })));
    }

    #[test]
    fn config_rejects_non_positive_window() {
        let zero = RateLimiterConfig::builder().window(TimeDelta::zero()).build();
        let negative = RateLimiterConfig::builder().window(secs(-1)).build();
        assert!(matches!(zero, Err(RateLimiterError::InvalidConfig { .. })));
        assert!(matches!(negative, Err(RateLimiterError::InvalidConfig { .. })));
    }

    // ------------------------------------------------------------------
    // SlidingWindow
    // ------------------------------------------------------------------

    #[test]
    fn window_prunes_exactly_expired_entries() {
        let mut window = SlidingWindow::new();
        window.record(t0());
        window.record(t0() + secs(30));

        window.prune(t0() + secs(59), secs(60));
        assert_eq!(window.len(), 2, "59 s old entry must survive");

        window.prune(t0() + secs(60), secs(60));
        assert_eq!(window.len(), 1, "entry exactly 60 s old must be pruned");

        window.prune(t0() + secs(90), secs(60));
        assert!(window.is_empty());
    }

    #[test]
    fn window_keeps_future_entries_after_clock_step_back() {
        let mut window = SlidingWindow::new();
        window.record(t0() + secs(10));
        window.prune(t0(), secs(60));
        assert_eq!(window.len(), 1);
    }

    // ------------------------------------------------------------------
    // RateLimiter
    // ------------------------------------------------------------------

    #[test]
    fn eleventh_request_in_window_is_limited() {
        let mut limiter = default_limiter();
        let user = UserId::new_random();
        for i in 0..10 {
            assert_eq!(limiter.check(user, t0() + TimeDelta::milliseconds(i * 50)), RateDecision::Allowed, "request {i}");
        }
        assert_eq!(limiter.check(user, t0() + TimeDelta::milliseconds(600)), RateDecision::Limited);
        assert_eq!(limiter.requests_in_window(user), 10, "limited request must not be recorded");
    }

    #[test]
    fn window_reopens_once_oldest_entry_expires() {
        let mut limiter = default_limiter();
        let user = UserId::new_random();
        for i in 0..10 {
            limiter.check(user, t0() + secs(i));
        }
        // Oldest entry (t0) is 59 s old: still counted.
        assert_eq!(limiter.check(user, t0() + secs(59)), RateDecision::Limited);
        // Oldest entry is exactly 60 s old: pruned, one slot frees up.
        assert_eq!(limiter.check(user, t0() + secs(60)), RateDecision::Allowed);
        assert_eq!(limiter.check(user, t0() + secs(60)), RateDecision::Limited);
    }

    #[test]
    fn full_reset_after_inactivity() {
        let mut limiter = default_limiter();
        let user = UserId::new_random();
        for _ in 0..10 {
            limiter.check(user, t0());
        }
        assert_eq!(limiter.check(user, t0() + secs(1)), RateDecision::Limited);
        assert_eq!(limiter.check(user, t0() + secs(61)), RateDecision::Allowed);
        assert_eq!(limiter.requests_in_window(user), 1);
    }

    #[test]
    fn users_are_isolated() {
        let mut limiter = default_limiter();
        let (a, b) = (UserId::new_random(), UserId::new_random());
        for _ in 0..10 {
            limiter.check(a, t0());
        }
        assert_eq!(limiter.check(a, t0()), RateDecision::Limited);
        assert_eq!(limiter.check(b, t0()), RateDecision::Allowed);
    }

    #[test]
    fn is_limited_does_not_record() {
        let mut limiter = default_limiter();
        let user = UserId::new_random();
        for _ in 0..20 {
            assert!(!limiter.is_limited(user, t0()));
        }
        assert_eq!(limiter.requests_in_window(user), 0);
    }

    #[test]
    fn record_then_is_limited_matches_check() {
        let mut limiter = RateLimiter::new(RateLimiterConfig::builder().max_requests(2).build().unwrap());
        let user = UserId::new_random();
        limiter.record(user, t0());
        assert!(!limiter.is_limited(user, t0()));
        limiter.record(user, t0());
        assert!(limiter.is_limited(user, t0()));
    }

    #[test]
    fn custom_window_is_honoured() {
        let config = RateLimiterConfig::builder().max_requests(1).window(secs(5)).build().unwrap();
        let mut limiter = RateLimiter::new(config);
        let user = UserId::new_random();
        assert_eq!(limiter.check(user, t0()), RateDecision::Allowed);
        assert_eq!(limiter.check(user, t0() + secs(4)), RateDecision::Limited);
        assert_eq!(limiter.check(user, t0() + secs(5)), RateDecision::Allowed);
    }
}
