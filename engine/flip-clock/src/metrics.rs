//! Metrics collection for FlipClock

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collected by the FlipClock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlipMetrics {
    /// Updates processed, the init pass included
    pub ticks_processed: u64,

    /// Digit positions that differed from the previous update
    pub digits_changed: u64,

    /// Reveals scheduled
    pub flips_started: u64,

    /// Settles that cleared a flipped marker
    pub flips_settled: u64,

    /// Deferred tasks dropped at teardown
    pub tasks_cancelled: u64,

    /// Field values squeezed by the overflow policy
    pub overflow_events: u64,

    /// Duration of the last update in nanoseconds
    pub last_tick_duration_ns: u64,

    /// Maximum update duration in nanoseconds
    pub max_tick_duration_ns: u64,

    /// Seconds since the collector was created
    pub uptime_seconds: u64,
}

/// Lock-free counters shared between the clock and whoever reports on it
#[derive(Debug)]
pub struct MetricsCollector {
    ticks: AtomicU64,
    digits_changed: AtomicU64,
    flips_started: AtomicU64,
    flips_settled: AtomicU64,
    tasks_cancelled: AtomicU64,
    overflow_events: AtomicU64,
    last_tick_duration: AtomicU64,
    max_tick_duration: AtomicU64,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            digits_changed: AtomicU64::new(0),
            flips_started: AtomicU64::new(0),
            flips_settled: AtomicU64::new(0),
            tasks_cancelled: AtomicU64::new(0),
            overflow_events: AtomicU64::new(0),
            last_tick_duration: AtomicU64::new(0),
            max_tick_duration: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed update
    pub fn record_tick(&self, duration: Duration, digits_changed: usize) {
        let duration_ns = duration.as_nanos() as u64;

        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.digits_changed.fetch_add(digits_changed as u64, Ordering::Relaxed);
        self.last_tick_duration.store(duration_ns, Ordering::Relaxed);

        // Update max duration
        let mut max_duration = self.max_tick_duration.load(Ordering::Relaxed);
        while duration_ns > max_duration {
            match self.max_tick_duration.compare_exchange_weak(
                max_duration,
                duration_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => max_duration = current,
            }
        }
    }

    pub fn record_flip_started(&self) {
        self.flips_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flip_settled(&self) {
        self.flips_settled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self, count: usize) {
        self.tasks_cancelled.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_overflow(&self) {
        self.overflow_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> FlipMetrics {
        FlipMetrics {
            ticks_processed: self.ticks.load(Ordering::Relaxed),
            digits_changed: self.digits_changed.load(Ordering::Relaxed),
            flips_started: self.flips_started.load(Ordering::Relaxed),
            flips_settled: self.flips_settled.load(Ordering::Relaxed),
            tasks_cancelled: self.tasks_cancelled.load(Ordering::Relaxed),
            overflow_events: self.overflow_events.load(Ordering::Relaxed),
            last_tick_duration_ns: self.last_tick_duration.load(Ordering::Relaxed),
            max_tick_duration_ns: self.max_tick_duration.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}
