//! Mock wall clock
//!
//! Token validity is judged against wall-clock seconds. [`MockClock`] keeps
//! that value under test control; clones share the same instant so a test
//! can hold one copy while the code under test holds another.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use taxdesk_common::testing::MockClock;
/// use taxdesk_common::Clock;
///
/// let clock = MockClock::at(1_000);
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.unix_timestamp(), 1_005);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a clock frozen at the current real time
    #[must_use]
    pub fn new() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a clock frozen at `unix_seconds`
    #[must_use]
    pub fn at(unix_seconds: i64) -> Self {
        let instant = Utc.timestamp_opt(unix_seconds, 0).single().unwrap_or_else(Utc::now);
        Self::from_datetime(instant)
    }

    fn from_datetime(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    /// Jump to an absolute Unix timestamp
    pub fn set(&self, unix_seconds: i64) {
        if let Some(instant) = Utc.timestamp_opt(unix_seconds, 0).single() {
            *self.lock() = instant;
        }
    }

    /// Advance the clock by `duration`
    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut now = self.lock();
        *now += step;
    }

    pub fn advance_secs(&self, seconds: u64) {
        self.advance(Duration::from_secs(seconds));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::at(100);
        let shared = clock.clone();

        clock.advance_secs(25);
        assert_eq!(shared.unix_timestamp(), 125);

        shared.set(10);
        assert_eq!(clock.unix_timestamp(), 10);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let clock: Arc<dyn Clock> = Arc::new(MockClock::at(1_700_000_000));
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
    }
}
