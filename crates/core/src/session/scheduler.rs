//! Proactive refresh scheduling
//!
//! The scheduler owns a single [`TimerSlot`]. Arming always cancels whatever
//! was armed before, so at most one refresh timer exists per session.

use std::future::Future;
use std::time::Duration;

use taxdesk_common::{TimerHandle, TimerSlot};
use taxdesk_domain::SessionConfig;
use tracing::debug;

#[derive(Debug)]
pub struct RefreshScheduler {
    lead_secs: i64,
    slot: TimerSlot,
}

impl RefreshScheduler {
    pub fn new(lead_secs: i64) -> Self {
        Self { lead_secs: lead_secs.max(0), slot: TimerSlot::new() }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.refresh_lead_seconds)
    }

    /// `max(0, seconds_until_expiry - lead)`
    pub fn delay_for(&self, seconds_until_expiry: i64) -> Duration {
        let secs = seconds_until_expiry.saturating_sub(self.lead_secs).max(0);
        Duration::from_secs(secs.unsigned_abs())
    }

    /// Arm the refresh timer, replacing any armed one
    pub fn arm<F>(&self, delay: Duration, task: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.slot.arm(delay, task)
    }

    /// Arm for a token expiring in `seconds_until_expiry`; returns the delay
    pub fn schedule<F>(&self, seconds_until_expiry: i64, task: F) -> Duration
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay_for(seconds_until_expiry);
        debug!(
            expires_in = seconds_until_expiry,
            delay_secs = delay.as_secs(),
            "Scheduling token refresh"
        );
        self.slot.arm(delay, task);
        delay
    }

    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
