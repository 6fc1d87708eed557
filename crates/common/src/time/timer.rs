//! Single-slot one-shot timers
//!
//! A [`TimerSlot`] owns at most one armed timer. Arming a new timer always
//! cancels the previous one first, so callers never end up with two live
//! callbacks for the same purpose. Each timer runs on its own tokio task and
//! is cancelled through a [`CancellationToken`].
//!
//! When a timer fires it vacates the slot *before* running its task. The task
//! is therefore free to arm the same slot again (recursive rescheduling).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A timer handle that can be used to cancel a timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    cancel: CancellationToken,
}

impl TimerHandle {
    /// Cancel the timer
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if the timer has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Identifier unique within the owning slot
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Owner of at most one armed timer
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Arc<Mutex<Option<TimerHandle>>>,
    next_id: AtomicU64,
}

impl TimerSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer that runs `task` after `delay`
    ///
    /// Any timer already held by this slot is cancelled first. Must be called
    /// from within a tokio runtime.
    pub fn arm<F>(&self, delay: Duration, task: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = TimerHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            cancel: CancellationToken::new(),
        };

        if let Some(previous) = self.armed.lock().replace(handle.clone()) {
            previous.cancel();
            debug!(previous = previous.id, "Replaced armed timer");
        }

        let slot = Arc::clone(&self.armed);
        let fired = handle.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = fired.cancel.cancelled() => {
                    trace!(timer = fired.id, "Timer cancelled before firing");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            {
                let mut armed = slot.lock();
                match armed.as_ref() {
                    Some(current) if current.id == fired.id => {
                        armed.take();
                    }
                    _ => return,
                }
            }

            trace!(timer = fired.id, "Timer fired");
            task.await;
        });

        debug!(timer = handle.id, delay_secs = delay.as_secs(), "Timer armed");
        handle
    }

    /// Cancel the armed timer, if any
    ///
    /// Returns `true` when a timer was cancelled.
    pub fn cancel(&self) -> bool {
        match self.armed.lock().take() {
            Some(handle) => {
                handle.cancel();
                debug!(timer = handle.id, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Check whether a timer is currently armed
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.lock().is_some()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.armed.lock().take() {
            handle.cancel();
        }
    }
}
