// Rust guideline compliant 2026-10-19

//! Wall-clock adapter for the `Clock` port.
//!
//! Reads `chrono::Utc::now()` but never steps backwards: if the OS clock is
//! adjusted into the past, the last returned instant is repeated until real
//! time catches up. Rate windows and history order rely on that.

use chrono::Utc;
use domain::{Clock, Timestamp};
use parking_lot::Mutex;

/// `Clock` adapter backed by the system clock, clamped to be non-decreasing.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    /// Create a clock with no prior reading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn clamp(&self, reading: Timestamp) -> Timestamp {
        let mut last = self.last.lock();
        let now = match *last {
            Some(prev) if prev > reading => prev,
            _ => reading,
        };
        *last = Some(now);
        now
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.clamp(Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SystemClock;
    use chrono::{TimeDelta, Utc};
    use domain::Clock as _;

    #[test]
    fn readings_never_decrease() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn backwards_step_is_clamped() {
        let clock = SystemClock::new();
        let later = Utc::now() + TimeDelta::hours(1);
        assert_eq!(clock.clamp(later), later);
        assert_eq!(clock.clamp(later - TimeDelta::seconds(5)), later);
        assert_eq!(clock.now(), later, "real time is behind the last reading");
    }

    #[test]
    fn forward_readings_pass_through() {
        let clock = SystemClock::new();
        let t = Utc::now();
        assert_eq!(clock.clamp(t), t);
        let t2 = t + TimeDelta::milliseconds(10);
        assert_eq!(clock.clamp(t2), t2);
    }
}
