//! Timestamp type used throughout the simulation.
//!
//! Timestamps are Unix epoch seconds (UTC). Poll windows, position terms and
//! payout periods are all measured against these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SECS_PER_HOUR: u64 = 3_600;
pub const SECS_PER_DAY: u64 = 86_400;
pub const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn minus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    pub fn plus_hours(&self, hours: u64) -> Self {
        self.plus_secs(hours.saturating_mul(SECS_PER_HOUR))
    }

    pub fn plus_days(&self, days: u64) -> Self {
        self.plus_secs(days.saturating_mul(SECS_PER_DAY))
    }
}

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_arithmetic_saturates() {
        let t = Timestamp::new(100);
        assert_eq!(t.plus_days(2).as_secs(), 100 + 2 * SECS_PER_DAY);
        assert_eq!(t.minus_secs(1_000), Timestamp::EPOCH);
        assert_eq!(Timestamp::new(u64::MAX).plus_hours(1).as_secs(), u64::MAX);
    }

    #[test]
    fn expiry_is_inclusive() {
        let t = Timestamp::new(1_000);
        assert!(t.has_expired(10, Timestamp::new(1_010)));
        assert!(!t.has_expired(10, Timestamp::new(1_009)));
    }
}
