//! Error types for FlipClock

use thiserror::Error;

/// Errors that can occur in the FlipClock
#[derive(Error, Debug)]
pub enum FlipError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Start time is missing")]
    MissingStartTime,

    #[error("Start time {0} is not a finite number of seconds")]
    InvalidStartTime(f64),

    #[error("Failed to access config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Clock has been torn down")]
    TornDown,

    #[error("Tick driver is not running")]
    DriverNotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlipError {
    /// Whether the error was raised while building the widget, before any state existed
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FlipError::Config(_)
                | FlipError::MissingStartTime
                | FlipError::InvalidStartTime(_)
                | FlipError::ConfigFile { .. }
                | FlipError::ConfigParse(_)
        )
    }
}
