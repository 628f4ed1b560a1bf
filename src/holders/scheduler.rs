/// Snapshot refresh scheduling: rate gate, single-flight guard, periodic timer
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

use crate::errors::{HolderWatchError, Result};

/// Held while a snapshot refresh runs; releases the slot on drop
pub struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct RefreshScheduler {
    interval_ms: i64,
    last_refresh: Mutex<Option<i64>>,
    in_flight: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_ms: (interval_secs.max(1) as i64).saturating_mul(1000),
            last_refresh: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            timer: Mutex::new(None),
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    pub fn last_refresh(&self) -> Option<i64> {
        *self.last_refresh.lock()
    }

    /// Earliest time an explicit refresh is accepted
    pub fn next_allowed(&self) -> Option<i64> {
        self.last_refresh().map(|last| last.saturating_add(self.interval_ms))
    }

    /// Reject an explicit trigger arriving before the interval elapsed
    ///
    /// The reported wait is rounded up to whole seconds and never exceeds the
    /// interval, even if the clock stepped backwards.
    pub fn check_manual(&self, now: i64) -> Result<()> {
        let Some(last) = self.last_refresh() else {
            return Ok(());
        };

        let elapsed = now.saturating_sub(last);
        if elapsed >= self.interval_ms {
            return Ok(());
        }

        let remaining_ms = (self.interval_ms - elapsed).clamp(0, self.interval_ms);
        let wait_secs = ((remaining_ms + 999) / 1000) as u64;

        Err(HolderWatchError::RateLimited {
            wait_secs,
            next_allowed_ms: last.saturating_add(self.interval_ms),
        })
    }

    /// Whether a periodic tick should refresh now
    pub fn is_due(&self, now: i64) -> bool {
        match self.last_refresh() {
            Some(last) => now.saturating_sub(last) >= self.interval_ms,
            None => true,
        }
    }

    /// Claim the single refresh slot
    pub fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                flag: &self.in_flight,
            })
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn mark_refreshed(&self, now: i64) {
        *self.last_refresh.lock() = Some(now);
    }

    /// Install the periodic timer task, aborting any previous one
    pub fn arm(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn disarm(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .map_or(false, |h| !h.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Claim the refresh slot for an explicit trigger
pub fn ensure_not_refreshing(scheduler: &RefreshScheduler) -> Result<RefreshGuard<'_>> {
    scheduler
        .try_begin()
        .ok_or(HolderWatchError::RefreshInProgress {
            wait_secs: ((scheduler.interval_ms().max(0) + 999) / 1000) as u64,
        })
}
