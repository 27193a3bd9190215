//! Runtime control state for the driver loop.
//!
//! [`DriverControl`] is shared between the driver loop and the control
//! surface. The loop reads it every iteration; handlers change the poll
//! interval or request a stop without touching the machine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::config::MIN_POLL_INTERVAL_MS;

/// Shared driver loop control state.
#[derive(Debug)]
pub struct DriverControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes every task waiting in [`stopped`](Self::stopped).
    stop_notify: Notify,

    /// Current poll interval in milliseconds (runtime-adjustable).
    poll_interval_ms: AtomicU64,

    /// Number of ticks run so far.
    ticks: AtomicU64,

    /// Wall-clock time when the driver was created.
    started_at: DateTime<Utc>,
}

impl DriverControl {
    /// Create control state with the given poll interval.
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            poll_interval_ms: AtomicU64::new(poll_interval_ms.max(MIN_POLL_INTERVAL_MS)),
            ticks: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop and wake everything waiting on it.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested. Returns immediately if it already was.
    ///
    /// Any number of tasks may wait at once; all of them return.
    pub async fn stopped(&self) {
        loop {
            let mut notified = std::pin::pin!(self.stop_notify.notified());
            // Register before checking the flag so a concurrent stop is not missed.
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    // -----------------------------------------------------------------------
    // Poll interval
    // -----------------------------------------------------------------------

    /// Current poll interval in milliseconds.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.load(Ordering::Acquire)
    }

    /// Current poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms())
    }

    /// Set the poll interval in milliseconds.
    ///
    /// Returns the previous interval, or `None` if the value was rejected
    /// (below [`MIN_POLL_INTERVAL_MS`]).
    pub fn set_poll_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_POLL_INTERVAL_MS {
            return None;
        }
        Some(self.poll_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Count one completed tick. Returns the new total.
    pub fn record_tick(&self) -> u64 {
        self.ticks
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot for the control surface.
    pub fn status(&self, simulation: bool) -> DriverStatus {
        DriverStatus {
            ticks: self.ticks(),
            poll_interval_ms: self.poll_interval_ms(),
            stop_requested: self.is_stop_requested(),
            simulation,
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds(),
        }
    }
}

/// JSON-serializable status of the driver loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStatus {
    /// Ticks run so far.
    pub ticks: u64,
    /// Current poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Whether software input triggers are accepted.
    pub simulation: bool,
    /// When the driver started.
    pub started_at: DateTime<Utc>,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn interval_below_minimum_rejected() {
        let control = DriverControl::new(100);
        assert_eq!(control.set_poll_interval_ms(MIN_POLL_INTERVAL_MS - 1), None);
        assert_eq!(control.poll_interval_ms(), 100);
        assert_eq!(control.set_poll_interval_ms(250), Some(100));
        assert_eq!(control.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn initial_interval_is_clamped() {
        let control = DriverControl::new(1);
        assert_eq!(control.poll_interval_ms(), MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn ticks_are_counted() {
        let control = DriverControl::new(100);
        assert_eq!(control.record_tick(), 1);
        assert_eq!(control.record_tick(), 2);
        assert_eq!(control.ticks(), 2);
    }

    #[test]
    fn status_serializes() {
        let control = DriverControl::new(100);
        control.request_stop();
        let json = serde_json::to_value(control.status(true)).unwrap();
        assert_eq!(json["poll_interval_ms"], 100);
        assert_eq!(json["stop_requested"], true);
        assert_eq!(json["simulation"], true);
    }

    #[tokio::test]
    async fn stop_wakes_every_waiter() {
        let control = Arc::new(DriverControl::new(100));
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let control = Arc::clone(&control);
                tokio::spawn(async move { control.stopped().await })
            })
            .collect();
        tokio::task::yield_now().await;

        control.request_stop();
        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert!(control.is_stop_requested());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_after_stop() {
        let control = DriverControl::new(100);
        control.request_stop();
        control.stopped().await;
    }
}
