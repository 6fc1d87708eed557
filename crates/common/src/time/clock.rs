//! Wall clock abstraction
//!
//! Bearer tokens carry absolute Unix expiry timestamps, so expiry checks need
//! wall time rather than a monotonic `Instant`. Routing every read through
//! [`Clock`] lets tests pin "now" without sleeping.

use chrono::{DateTime, Utc};

/// Source of the current wall clock time
pub trait Clock: Send + Sync + 'static {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Seconds since the Unix epoch
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
