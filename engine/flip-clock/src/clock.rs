//! Core FlipClock implementation

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{DisplayOptions, TimerConfig};
use crate::decompose::{decompose, ClockValues, Field};
use crate::error::FlipError;
use crate::format::{format_values, DigitSequence};
use crate::metrics::{FlipMetrics, MetricsCollector};
use crate::render::{Face, Layout, Renderer};
use crate::scheduler::{FlipScheduler, FlipTask};
use crate::source::ClockSource;
use crate::table::{ChangeSet, DigitTable, RotorState};

/// The flip clock widget: digit table, deferred flip queue and the renderer they drive
pub struct FlipClock<R: Renderer> {
    // Configuration
    start_seconds: f64,
    timer: TimerConfig,
    display: DisplayOptions,
    layout: Layout,

    // Time
    source: Arc<dyn ClockSource>,

    // Display state
    table: DigitTable,
    scheduler: FlipScheduler,
    renderer: R,

    // Metrics
    metrics: Arc<MetricsCollector>,
    overflow_reported: BTreeSet<Field>,

    torn_down: bool,
}

impl<R: Renderer> FlipClock<R> {
    /// Create a clock with default display options
    pub fn new(timer: TimerConfig, source: Arc<dyn ClockSource>, renderer: R) -> Result<Self, FlipError> {
        Self::with_display(timer, DisplayOptions::default(), source, renderer)
    }

    /// Create a clock, mount it on the renderer and run the init pass.
    ///
    /// Fails without touching the renderer when the start time or timing is invalid.
    pub fn with_display(
        timer: TimerConfig,
        display: DisplayOptions,
        source: Arc<dyn ClockSource>,
        mut renderer: R,
    ) -> Result<Self, FlipError> {
        let start_seconds = timer.start_seconds()?;
        timer.validate()?;

        let display = display.normalized();
        let layout = Layout::build(&timer.field_widths, &display);
        renderer.mount(&layout)?;

        tracing::info!(
            "Creating FlipClock on '{}' with {} rotors, start {}",
            layout.target,
            layout.rotor_count(),
            start_seconds
        );

        let mut clock = Self {
            start_seconds,
            table: DigitTable::new(&timer.field_widths),
            timer,
            display,
            layout,
            source,
            scheduler: FlipScheduler::new(),
            renderer,
            metrics: Arc::new(MetricsCollector::new()),
            overflow_reported: BTreeSet::new(),
            torn_down: false,
        };

        clock.update(true)?;
        Ok(clock)
    }

    /// Run one regular update: recompute the digits and queue flips for the ones that changed
    pub fn tick(&mut self) -> Result<ChangeSet, FlipError> {
        if self.torn_down {
            return Err(FlipError::TornDown);
        }
        self.update(false)
    }

    /// Run every deferred task whose deadline has passed; returns how many ran
    pub fn run_due(&mut self) -> Result<usize, FlipError> {
        if self.torn_down {
            return Err(FlipError::TornDown);
        }

        let mut ran = 0;
        while let Some((_, task)) = self.scheduler.pop_due(self.now_ms()) {
            match task {
                FlipTask::Reveal { position, digit } => self.reveal(position, digit),
                FlipTask::Settle { position } => self.settle(position),
            }
            ran += 1;
        }

        if ran > 0 {
            self.renderer.present()?;
        }
        Ok(ran)
    }

    /// Time left until the earliest deferred task is due
    pub fn time_until_next_task(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(self.now_ms())))
    }

    /// Cancel every deferred task and release the display. Returns the number cancelled.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }

        let cancelled = self.scheduler.cancel_all();
        for task in &cancelled {
            if let Some(slot) = self.table.slot_mut(task.position()) {
                slot.rotor.in_flight = slot.rotor.in_flight.saturating_sub(1);
            }
        }
        self.metrics.record_cancelled(cancelled.len());
        self.renderer.unmount();
        self.torn_down = true;

        tracing::info!("FlipClock torn down, {} deferred task(s) cancelled", cancelled.len());
        cancelled.len()
    }

    /// Decompose the current elapsed time without touching the display
    pub fn values_now(&self) -> ClockValues {
        decompose(self.source.now_seconds(), self.start_seconds)
    }

    /// Digits rendered by the last update
    pub fn displayed(&self) -> DigitSequence {
        self.table.previous()
    }

    pub fn rotor(&self, position: usize) -> Option<&RotorState> {
        self.table.slot(position).map(|s| &s.rotor)
    }

    pub fn table(&self) -> &DigitTable {
        &self.table
    }

    /// Deferred tasks still queued
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_seconds
    }

    pub fn config(&self) -> &TimerConfig {
        &self.timer
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Shared handle to the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> FlipMetrics {
        self.metrics.get_metrics()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn now_ms(&self) -> u64 {
        (self.source.now_seconds() * 1000.0).round().max(0.0) as u64
    }

    /// Decompose, format, diff and apply. `init` writes new digits directly without animating.
    fn update(&mut self, init: bool) -> Result<ChangeSet, FlipError> {
        let started = Instant::now();
        let now_ms = self.now_ms();

        let values = decompose(self.source.now_seconds(), self.start_seconds);
        let formatted = format_values(&values, &self.timer.field_widths, self.timer.overflow);
        for field in formatted.overflowed {
            self.metrics.record_overflow();
            if self.overflow_reported.insert(field) {
                tracing::warn!(
                    "{} value {} does not fit {} digit(s), applying {:?}",
                    field,
                    values.get(field),
                    self.timer.field_widths.width(field),
                    self.timer.overflow
                );
            }
        }

        let changes = self.table.diff(&formatted.digits)?;

        for change in changes.entries() {
            let position = change.position;
            let Some(slot) = self.table.slot_mut(position) else { continue };

            if init {
                // Every face shows the current digit; nothing animates
                for face in Face::ALL {
                    if slot.rotor.set_face(face, change.next) {
                        self.renderer.set_face(position, face, change.next);
                    }
                }
                continue;
            }

            // The leaf front and the lower card keep showing the outgoing digit
            for face in [Face::Front, Face::Bottom] {
                slot.rotor.set_face(face, change.previous);
                self.renderer.set_face(position, face, change.previous);
            }

            if change.changed() {
                slot.rotor.in_flight += 1;
                let reveal_at = now_ms.saturating_add(self.timer.flip_delay_ms);
                self.scheduler.schedule(reveal_at, FlipTask::Reveal { position, digit: change.next });
                self.metrics.record_flip_started();
            }
        }

        self.renderer.present()?;
        self.metrics.record_tick(started.elapsed(), changes.changed_count());

        tracing::debug!(
            init = init,
            values = %values,
            digits = %formatted.digits,
            changed = changes.changed_count(),
            "FlipClock update"
        );

        Ok(changes)
    }

    fn reveal(&mut self, position: usize, digit: char) {
        let transition_ms = self.timer.transition_ms;
        let now_ms = self.now_ms();
        let Some(slot) = self.table.slot_mut(position) else { return };

        if slot.rotor.set_face(Face::Top, digit) {
            self.renderer.set_face(position, Face::Top, digit);
        }

        if slot.rotor.set_face(Face::Rear, digit) {
            slot.rotor.flipped = true;
            self.renderer.set_face(position, Face::Rear, digit);
            self.renderer.set_flipped(position, true);
            self.scheduler.schedule(now_ms.saturating_add(transition_ms), FlipTask::Settle { position });
            tracing::debug!(position, digit = %digit, "Flip revealed");
        } else {
            // Nothing to animate; the flip ends here
            slot.rotor.in_flight = slot.rotor.in_flight.saturating_sub(1);
        }
    }

    fn settle(&mut self, position: usize) {
        let Some(slot) = self.table.slot_mut(position) else { return };
        slot.rotor.flipped = false;
        slot.rotor.in_flight = slot.rotor.in_flight.saturating_sub(1);
        self.renderer.set_flipped(position, false);
        self.metrics.record_flip_settled();
    }
}

impl<R: Renderer> Drop for FlipClock<R> {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}
