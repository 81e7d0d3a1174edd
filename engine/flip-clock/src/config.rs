//! Configuration for FlipClock

use crate::decompose::Field;
use crate::error::FlipError;
use crate::{
    DEFAULT_FLIP_DELAY_MS, DEFAULT_HEADINGS, DEFAULT_METRICS_INTERVAL_MS, DEFAULT_TARGET,
    DEFAULT_THEME, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TRANSITION_MS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration, as loaded from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    /// Timing and digit layout
    pub timer: TimerConfig,

    /// Display surface options
    pub display: DisplayOptions,

    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

/// Timing and digit layout of the clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Start instant in seconds since the Unix epoch. Required to build a clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_epoch_seconds: Option<f64>,

    /// Tick cadence in milliseconds (default: 1000ms)
    pub tick_interval_ms: u64,

    /// Delay between a digit change and its reveal, independent of the tick cadence
    pub flip_delay_ms: u64,

    /// Nominal duration of the flip transition before the marker is cleared
    pub transition_ms: u64,

    /// What to do with a value wider than its field
    pub overflow: OverflowPolicy,

    /// Digit count per field
    pub field_widths: FieldWidths,
}

/// Digit count per field, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWidths {
    pub years: usize,
    pub days: usize,
    pub hours: usize,
    pub minutes: usize,
    pub seconds: usize,
}

/// Policy for values that do not fit in their configured width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Show the largest value the field can hold (all nines)
    #[default]
    Saturate,
    /// Keep only the low-order digits
    Truncate,
}

/// Options for the display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Identifier of the target display surface
    pub target: String,

    /// Opaque theme label handed to the renderer
    pub theme: String,

    /// One heading per rotor group; anything but five entries falls back to the default
    pub headings: Vec<String>,
}

/// Monitoring and observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Enable periodic metrics emission from the driver
    pub emit_metrics: bool,

    /// Metrics emission interval in milliseconds
    pub metrics_interval_ms: u64,

    /// Log level for the clock
    pub log_level: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            start_epoch_seconds: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            flip_delay_ms: DEFAULT_FLIP_DELAY_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
            overflow: OverflowPolicy::default(),
            field_widths: FieldWidths::default(),
        }
    }
}

impl Default for FieldWidths {
    fn default() -> Self {
        Self { years: 1, days: 3, hours: 2, minutes: 2, seconds: 2 }
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            theme: DEFAULT_THEME.to_string(),
            headings: default_headings(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            emit_metrics: false,
            metrics_interval_ms: DEFAULT_METRICS_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }
}

/// Upper bound for every timing interval
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

fn default_headings() -> Vec<String> {
    DEFAULT_HEADINGS.iter().map(|h| h.to_string()).collect()
}

impl TimerConfig {
    /// Default timing with the given start instant
    pub fn starting_at(start_epoch_seconds: f64) -> Self {
        Self { start_epoch_seconds: Some(start_epoch_seconds), ..Default::default() }
    }

    /// The validated start instant
    pub fn start_seconds(&self) -> Result<f64, FlipError> {
        match self.start_epoch_seconds {
            None => Err(FlipError::MissingStartTime),
            Some(start) if !start.is_finite() => Err(FlipError::InvalidStartTime(start)),
            Some(start) => Ok(start),
        }
    }

    /// Get tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check everything except the start instant
    pub fn validate(&self) -> Result<(), FlipError> {
        if self.tick_interval_ms == 0 {
            return Err(FlipError::Config("tick_interval_ms must be greater than zero".into()));
        }
        for (name, value) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("flip_delay_ms", self.flip_delay_ms),
            ("transition_ms", self.transition_ms),
        ] {
            if value > MAX_INTERVAL_MS {
                return Err(FlipError::Config(format!(
                    "{name} must be at most {MAX_INTERVAL_MS} (one day), got {value}"
                )));
            }
        }
        self.field_widths.validate()
    }
}

impl FieldWidths {
    /// Width of one field
    pub fn width(&self, field: Field) -> usize {
        match field {
            Field::Years => self.years,
            Field::Days => self.days,
            Field::Hours => self.hours,
            Field::Minutes => self.minutes,
            Field::Seconds => self.seconds,
        }
    }

    /// Total digit count, i.e. the number of rotors
    pub fn total(&self) -> usize {
        Field::ALL.iter().map(|&f| self.width(f)).sum()
    }

    /// Every field needs at least one rotor
    pub fn validate(&self) -> Result<(), FlipError> {
        for field in Field::ALL {
            if self.width(field) == 0 {
                return Err(FlipError::Config(format!("width of {field} must be at least 1")));
            }
        }
        Ok(())
    }
}

impl DisplayOptions {
    /// Replace malformed headings with the default set
    pub fn normalized(mut self) -> Self {
        if self.headings.len() != DEFAULT_HEADINGS.len() {
            tracing::warn!(
                "Ignoring {} heading(s); exactly {} are required",
                self.headings.len(),
                DEFAULT_HEADINGS.len()
            );
            self.headings = default_headings();
        }
        if self.target.is_empty() {
            self.target = DEFAULT_TARGET.to_string();
        }
        self
    }
}

impl MonitoringConfig {
    /// Get metrics interval as Duration
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

impl FlipConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, FlipError> {
        let config: FlipConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check timing, widths and monitoring intervals
    pub fn validate(&self) -> Result<(), FlipError> {
        self.timer.validate()?;
        if self.monitoring.emit_metrics && self.monitoring.metrics_interval_ms == 0 {
            return Err(FlipError::Config("metrics_interval_ms must be greater than zero".into()));
        }
        if self.monitoring.metrics_interval_ms > MAX_INTERVAL_MS {
            return Err(FlipError::Config(format!(
                "metrics_interval_ms must be at most {MAX_INTERVAL_MS} (one day)"
            )));
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlipError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FlipError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), FlipError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| FlipError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_widths_total_ten_rotors() {
        assert_eq!(FieldWidths::default().total(), 10);
    }

    #[test]
    fn test_zero_width_rejected() {
        let widths = FieldWidths { hours: 0, ..Default::default() };
        assert!(matches!(widths.validate(), Err(FlipError::Config(_))));
    }

    #[test]
    fn test_oversized_intervals_rejected() {
        let timer = TimerConfig { flip_delay_ms: u64::MAX, ..TimerConfig::starting_at(0.0) };
        assert!(matches!(timer.validate(), Err(FlipError::Config(_))));

        let timer = TimerConfig { transition_ms: MAX_INTERVAL_MS + 1, ..TimerConfig::starting_at(0.0) };
        assert!(matches!(timer.validate(), Err(FlipError::Config(_))));

        let timer = TimerConfig { tick_interval_ms: MAX_INTERVAL_MS, ..TimerConfig::starting_at(0.0) };
        assert!(timer.validate().is_ok());
    }

    #[test]
    fn test_start_seconds_validation() {
        assert!(matches!(TimerConfig::default().start_seconds(), Err(FlipError::MissingStartTime)));
        assert!(matches!(
            TimerConfig::starting_at(f64::NAN).start_seconds(),
            Err(FlipError::InvalidStartTime(_))
        ));
        assert_eq!(TimerConfig::starting_at(12.5).start_seconds().unwrap(), 12.5);
    }

    #[test]
    fn test_headings_of_wrong_length_fall_back() {
        let options = DisplayOptions {
            headings: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(options.headings, default_headings());
    }

    #[test]
    fn test_custom_headings_and_theme_kept() {
        let headings: Vec<String> =
            ["Jahre", "Tage", "Stunden", "Minuten", "Sekunden"].iter().map(|s| s.to_string()).collect();
        let options =
            DisplayOptions { theme: "neon".into(), headings: headings.clone(), ..Default::default() }
                .normalized();
        assert_eq!(options.headings, headings);
        assert_eq!(options.theme, "neon");
    }
}
