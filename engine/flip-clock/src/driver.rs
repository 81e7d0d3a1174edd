//! Async tick driver
//!
//! Owns a [`FlipClock`] and is the only thing that calls into it, so ticks and deferred
//! reveals never overlap. The first update already ran when the clock was built; the
//! driver's first tick fires one interval later.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::clock::FlipClock;
use crate::config::{MonitoringConfig, MAX_INTERVAL_MS};
use crate::error::FlipError;
use crate::render::Renderer;

/// Drives a clock on tokio timers until asked to stop
pub struct TickDriver<R: Renderer> {
    clock: FlipClock<R>,
    monitoring: MonitoringConfig,
}

/// Stop signal and join handle for a spawned driver
pub struct DriverHandle<R: Renderer> {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<FlipClock<R>, FlipError>>,
}

impl<R: Renderer + 'static> TickDriver<R> {
    pub fn new(clock: FlipClock<R>) -> Self {
        Self { clock, monitoring: MonitoringConfig::default() }
    }

    pub fn with_monitoring(mut self, monitoring: MonitoringConfig) -> Self {
        self.monitoring = monitoring;
        self
    }

    /// Run on the current runtime in a background task
    pub fn spawn(self) -> DriverHandle<R> {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        DriverHandle { shutdown, task }
    }

    /// Drive the clock until `shutdown` turns true or its sender is dropped.
    ///
    /// The clock is torn down on the way out, on success and on error alike.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<FlipClock<R>, FlipError> {
        tracing::info!(
            "Starting FlipClock tick loop ({}ms cadence)",
            self.clock.config().tick_interval_ms
        );

        let result = self.drive(&mut shutdown).await;
        self.clock.teardown();

        match result {
            Ok(()) => {
                tracing::info!("FlipClock tick loop stopped");
                Ok(self.clock)
            }
            Err(e) => {
                tracing::error!("FlipClock tick loop failed: {}", e);
                Err(e)
            }
        }
    }

    async fn drive(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<(), FlipError> {
        let period = self.clock.config().tick_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        // Each tick re-reads the clock, so late ticks are simply pushed back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let metrics_period = self
            .monitoring
            .metrics_interval()
            .clamp(Duration::from_millis(1), Duration::from_millis(MAX_INTERVAL_MS));
        let mut metrics_ticker = interval_at(Instant::now() + metrics_period, metrics_period);
        let emit_metrics = self.monitoring.emit_metrics;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let next_task = self.clock.time_until_next_task();

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Driver handle dropped, stopping");
                        return Ok(());
                    }
                }

                _ = sleep(next_task.unwrap_or_default()), if next_task.is_some() => {
                    self.clock.run_due()?;
                }

                _ = ticker.tick() => {
                    // Work due at the same instant as the tick runs first
                    self.clock.run_due()?;
                    self.clock.tick()?;
                }

                _ = metrics_ticker.tick(), if emit_metrics => {
                    self.emit_metrics();
                }
            }
        }
    }

    fn emit_metrics(&self) {
        let metrics = self.clock.get_metrics();
        tracing::debug!(
            ticks = metrics.ticks_processed,
            digits_changed = metrics.digits_changed,
            flips_started = metrics.flips_started,
            flips_settled = metrics.flips_settled,
            overflow_events = metrics.overflow_events,
            max_tick_duration_ns = metrics.max_tick_duration_ns,
            "FlipClock metrics"
        );
    }
}

impl<R: Renderer> DriverHandle<R> {
    /// Ask the driver to stop; it finishes the step in progress first
    pub fn stop(&self) -> Result<(), FlipError> {
        self.shutdown.send(true).map_err(|_| FlipError::DriverNotRunning)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the driver to exit and take back the torn-down clock
    pub async fn join(self) -> Result<FlipClock<R>, FlipError> {
        self.task
            .await
            .map_err(|e| FlipError::Internal(format!("Tick driver task failed: {e}")))?
    }

    /// Stop and wait
    pub async fn shutdown(self) -> Result<FlipClock<R>, FlipError> {
        // The driver may already have exited on an error; join reports it
        let _ = self.stop();
        self.join().await
    }
}
