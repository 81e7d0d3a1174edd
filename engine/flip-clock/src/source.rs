//! Clock sources

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Wall-clock time source, so timing can be faked in tests
pub trait ClockSource: Send + Sync + std::fmt::Debug {
    /// Seconds since the Unix epoch
    fn now_seconds(&self) -> f64;
}

/// System wall clock with millisecond resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_seconds(&self) -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// Wall clock read once, then advanced by tokio's monotonic clock.
///
/// Immune to wall-clock steps while running, and follows paused time in tokio tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_seconds: f64,
    anchor: tokio::time::Instant,
}

impl MonotonicClock {
    /// Anchor to the current system time
    pub fn anchored_now() -> Self {
        Self::anchored_at(SystemClock.now_seconds())
    }

    /// Anchor so that the current instant reads `now_seconds`
    pub fn anchored_at(now_seconds: f64) -> Self {
        Self { anchor_seconds: now_seconds, anchor: tokio::time::Instant::now() }
    }
}

impl ClockSource for MonotonicClock {
    fn now_seconds(&self) -> f64 {
        self.anchor_seconds + self.anchor.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock. Clones share the same reading.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock reading `now_seconds`
    pub fn new(now_seconds: f64) -> Self {
        Self { now: Arc::new(Mutex::new(now_seconds)) }
    }

    /// Move the reading forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by.as_secs_f64();
    }

    /// Jump to an absolute reading, which may be in the past
    pub fn set(&self, now_seconds: f64) {
        *self.now.lock() = now_seconds;
    }
}

impl ClockSource for ManualClock {
    fn now_seconds(&self) -> f64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(100.0);
        let other = clock.clone();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(other.now_seconds(), 101.5);
        other.set(5.0);
        assert_eq!(clock.now_seconds(), 5.0);
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        assert!(SystemClock.now_seconds() > 1_577_836_800.0);
    }
}
