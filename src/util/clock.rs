//! Wall-clock sources.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and dry runs.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Clock frozen at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at `epoch_secs`; out-of-range values clamp to the epoch.
    pub fn at_secs(epoch_secs: i64) -> Self {
        Self::new(
            DateTime::<Utc>::from_timestamp(epoch_secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves_only_when_told() {
        let clock = FixedClock::at_secs(900);
        assert_eq!(clock.now().timestamp(), 900);
        clock.advance(Duration::minutes(15));
        assert_eq!(clock.now().timestamp(), 1800);
        clock.set(DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(clock.now().timestamp(), 0);
    }
}
