//! # FlipClock
//!
//! Count-up timer engine that drives a grid of mechanical "flip" digits.
//!
//! Every tick the elapsed time since a start instant is decomposed into years, days,
//! hours, minutes and seconds, formatted into one fixed-length digit sequence, and
//! diffed against the previously rendered sequence. Only the positions that changed
//! get a two-phase flip (a delayed reveal followed by a settle); the first render
//! after construction writes every digit directly without animating.
//!
//! Rendering itself is delegated to a [`Renderer`] implementation.

pub mod clock;
pub mod config;
pub mod decompose;
pub mod driver;
pub mod error;
pub mod format;
pub mod metrics;
pub mod render;
pub mod scheduler;
pub mod source;
pub mod table;

#[cfg(test)]
mod tests;


pub use clock::FlipClock;
pub use config::{
    DisplayOptions, FieldWidths, FlipConfig, MonitoringConfig, OverflowPolicy, TimerConfig,
};
pub use decompose::{decompose, ClockValues, Field};
pub use driver::{DriverHandle, TickDriver};
pub use error::FlipError;
pub use format::{format_values, pad, DigitSequence, Formatted};
pub use metrics::{FlipMetrics, MetricsCollector};
pub use render::{Face, Layout, MemoryRenderer, RenderOp, Renderer, RotorGroup};
pub use scheduler::{FlipScheduler, FlipTask, TaskId};
pub use source::{ClockSource, ManualClock, MonotonicClock, SystemClock};
pub use table::{ChangeSet, DigitChange, DigitSlot, DigitTable, RotorState};

/// Current version of the FlipClock engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tick cadence (one update per second)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default delay between a digit change and its reveal
pub const DEFAULT_FLIP_DELAY_MS: u64 = 500;

/// Default nominal duration of the host's flip transition
pub const DEFAULT_TRANSITION_MS: u64 = 500;

/// Default metrics emission interval
pub const DEFAULT_METRICS_INTERVAL_MS: u64 = 10_000;

/// Display surface identifier used when none is given
pub const DEFAULT_TARGET: &str = "flipdown";

/// Theme label used when none is given
pub const DEFAULT_THEME: &str = "dark";

/// Heading labels for the five rotor groups
pub const DEFAULT_HEADINGS: [&str; 5] = ["Years", "Days", "Hours", "Minutes", "Seconds"];

/// Seconds in a (Julian) year, the largest decomposition unit
pub const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;
