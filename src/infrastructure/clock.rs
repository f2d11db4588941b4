//! # Clock
//!
//! Time source port. Every lock-window check and event timestamp reads the
//! engine's clock, so tests drive time explicitly with [`ManualClock`].

use crate::domain::value_objects::timestamp::Timestamp;
use parking_lot::Mutex;
use std::fmt;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `secs`, saturating at the maximum instant.
    pub fn advance_secs(&self, secs: u64) {
        let mut now = self.now.lock();
        *now = now.saturating_add_secs(secs);
    }

    /// Sets the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Timestamp::from_secs(1_000).unwrap();
        let clock = ManualClock::new(start);
        clock.advance_secs(1_200);
        assert_eq!(clock.now().timestamp_secs(), 2_200);
    }

    #[test]
    fn manual_clock_set() {
        let clock = ManualClock::new(Timestamp::from_secs(5).unwrap());
        clock.set(Timestamp::from_secs(1).unwrap());
        assert_eq!(clock.now().timestamp_secs(), 1);
    }

    #[test]
    fn system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.timestamp_secs() > 1_600_000_000);
    }
}
