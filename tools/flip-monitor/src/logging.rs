//! Logging and tracing setup

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Where log lines go
pub enum LogSink<'a> {
    Stderr,
    File(&'a Path),
    /// Full-screen mode without a log file: nothing may write to the terminal
    Discard,
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn initialize_logging(level: &str, sink: LogSink<'_>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match sink {
        LogSink::Stderr => {
            let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
        }
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let fmt_layer = fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
        }
        LogSink::Discard => {}
    }

    Ok(())
}
