use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use flip_clock::{
    decompose, format_values, ClockSource, DriverHandle, Field, FlipClock, FlipConfig,
    FlipMetrics, MonotonicClock, Renderer, SystemClock, TickDriver,
};
use tokio::sync::mpsc;

mod logging;
mod plain;
mod terminal;

use logging::{initialize_logging, LogSink};
use plain::PlainRenderer;
use terminal::TerminalRenderer;

#[derive(Parser)]
#[command(name = "flip-monitor")]
#[command(about = "Flip clock counting up from a start instant")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen flip clock
    Run {
        #[command(flatten)]
        clock: ClockArgs,

        /// Append logs to this file (logging is off otherwise)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print the digit row and flip events line by line
    Plain {
        #[command(flatten)]
        clock: ClockArgs,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Print the current elapsed time once
    Once {
        #[command(flatten)]
        clock: ClockArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file starting the clock now
    InitConfig {
        /// Output path
        #[arg(default_value = "flip-clock.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ClockArgs {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start instant in Unix seconds
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "start_now")]
    start: Option<f64>,

    /// Count up from the current instant
    #[arg(long)]
    start_now: bool,

    /// Theme label (dark, light)
    #[arg(long)]
    theme: Option<String>,

    /// Display target name
    #[arg(long)]
    target: Option<String>,

    /// Log level, overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

impl ClockArgs {
    /// Config file (or defaults) with command-line overrides applied
    fn resolve(&self) -> Result<FlipConfig> {
        let mut config = match &self.config {
            Some(path) => FlipConfig::from_file(path)?,
            None => FlipConfig::default(),
        };

        if self.start_now {
            config.timer.start_epoch_seconds = Some(SystemClock.now_seconds());
        } else if let Some(start) = self.start {
            config.timer.start_epoch_seconds = Some(start);
        }
        if let Some(theme) = &self.theme {
            config.display.theme = theme.clone();
        }
        if let Some(target) = &self.target {
            config.display.target = target.clone();
        }
        if let Some(level) = &self.log_level {
            config.monitoring.log_level = level.clone();
        }

        config.validate()?;
        config.timer.start_seconds().context(
            "No start time: pass --start <unix seconds>, --start-now, or set timer.start_epoch_seconds",
        )?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { clock, log_file } => {
            let config = clock.resolve()?;
            let sink = match &log_file {
                Some(path) => LogSink::File(path),
                None => LogSink::Discard,
            };
            initialize_logging(&config.monitoring.log_level, sink)?;
            run_fullscreen(config).await
        }
        Commands::Plain { clock, duration } => {
            let config = clock.resolve()?;
            initialize_logging(&config.monitoring.log_level, LogSink::Stderr)?;
            run_plain(config, duration.map(Duration::from_secs)).await
        }
        Commands::Once { clock, json } => show_once(&clock.resolve()?, json),
        Commands::InitConfig { path, force } => init_config(path, force),
    }
}

/// Build the clock and hand it to a tick driver
fn start_driver<R: Renderer + 'static>(config: &FlipConfig, renderer: R) -> Result<DriverHandle<R>> {
    let clock = FlipClock::with_display(
        config.timer.clone(),
        config.display.clone(),
        Arc::new(MonotonicClock::anchored_now()),
        renderer,
    )?;
    Ok(TickDriver::new(clock).with_monitoring(config.monitoring.clone()).spawn())
}

async fn wait_finished<R: Renderer>(handle: &DriverHandle<R>) {
    while !handle.is_finished() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn run_fullscreen(config: FlipConfig) -> Result<()> {
    let start = config.timer.start_seconds()?;
    let handle = start_driver(&config, TerminalRenderer::new(start_caption(start)))?;

    let (quit_tx, mut quit_rx) = mpsc::channel(1);
    let input_done = Arc::new(AtomicBool::new(false));
    let input = tokio::task::spawn_blocking({
        let done = input_done.clone();
        move || terminal::watch_keys(quit_tx, done)
    });

    tokio::select! {
        _ = quit_rx.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
        _ = wait_finished(&handle) => {}
    }

    input_done.store(true, Ordering::Relaxed);
    let clock = handle.shutdown().await?;
    input.await?.context("Keyboard input failed")?;

    print_summary(&clock.get_metrics());
    Ok(())
}

async fn run_plain(config: FlipConfig, duration: Option<Duration>) -> Result<()> {
    let start = config.timer.start_seconds()?;
    println!("{}", "🚀 Starting flip clock".cyan().bold());
    println!("  {}", start_caption(start));
    println!("  Tick interval: {}ms", config.timer.tick_interval_ms);
    println!("{}", "Press Ctrl+C to exit.".green());
    println!();

    let handle = start_driver(&config, PlainRenderer::new())?;

    let limit = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = limit => {}
        _ = tokio::signal::ctrl_c() => {}
        _ = wait_finished(&handle) => {}
    }

    let clock = handle.shutdown().await?;
    print_summary(&clock.get_metrics());
    Ok(())
}

fn show_once(config: &FlipConfig, json: bool) -> Result<()> {
    let start = config.timer.start_seconds()?;
    let values = decompose(SystemClock.now_seconds(), start);
    let formatted = format_values(&values, &config.timer.field_widths, config.timer.overflow);

    if json {
        let mut fields = serde_json::Map::new();
        for field in Field::ALL {
            fields.insert(field.to_string(), values.get(field).into());
        }
        let output = serde_json::json!({
            "start_epoch_seconds": start,
            "fields": fields,
            "digits": formatted.digits.as_str(),
            "overflowed": formatted.overflowed.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", start_caption(start).cyan());
    for (field, heading) in Field::ALL.iter().zip(&config.display.headings) {
        println!("  {:<8} {}", format!("{heading}:"), values.get(*field));
    }
    println!("  {:<8} {}", "Digits:", formatted.digits.as_str().bold());
    for field in &formatted.overflowed {
        println!("  {}", format!("⚠️  {field} does not fit its rotors").yellow());
    }
    Ok(())
}

fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut config = FlipConfig::default();
    config.timer.start_epoch_seconds = Some(SystemClock.now_seconds().floor());
    config.to_file(&path)?;

    println!("{}", format!("✅ Wrote {}", path.display()).green());
    Ok(())
}

fn start_caption(start: f64) -> String {
    match DateTime::<Utc>::from_timestamp(start.floor() as i64, 0) {
        Some(at) => format!("Counting since {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
        None => format!("Counting since {start}"),
    }
}

fn print_summary(metrics: &FlipMetrics) {
    println!();
    println!("{}", "📊 Clock summary".cyan().bold());
    println!("  Ticks processed: {}", metrics.ticks_processed);
    println!("  Digits changed: {}", metrics.digits_changed);
    println!("  Flips started/settled: {}/{}", metrics.flips_started, metrics.flips_settled);
    println!("  Deferred tasks cancelled: {}", metrics.tasks_cancelled);
    if metrics.overflow_events > 0 {
        println!("  {}", format!("Overflow events: {}", metrics.overflow_events).yellow());
    }
    println!("  Max tick time: {}µs", metrics.max_tick_duration_ns / 1_000);
    println!("  Uptime: {}s", metrics.uptime_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ClockArgs {
        ClockArgs {
            config: None,
            start: None,
            start_now: false,
            theme: None,
            target: None,
            log_level: None,
        }
    }

    #[test]
    fn test_missing_start_is_rejected() {
        let err = args().resolve().unwrap_err();
        assert!(err.to_string().contains("No start time"));
    }

    #[test]
    fn test_overrides_applied() {
        let config = ClockArgs {
            start: Some(1_700_000_000.0),
            theme: Some("light".into()),
            target: Some("lobby".into()),
            ..args()
        }
        .resolve()
        .unwrap();

        assert_eq!(config.timer.start_epoch_seconds, Some(1_700_000_000.0));
        assert_eq!(config.display.theme, "light");
        assert_eq!(config.display.target, "lobby");
    }

    #[test]
    fn test_start_now_wins_over_config_file() {
        let path = std::env::temp_dir().join(format!("flip-monitor-{}.toml", std::process::id()));
        let mut file_config = FlipConfig::default();
        file_config.timer.start_epoch_seconds = Some(0.0);
        file_config.to_file(&path).unwrap();

        let config = ClockArgs { config: Some(path.clone()), start_now: true, ..args() }
            .resolve()
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.timer.start_epoch_seconds.unwrap() > 1_577_836_800.0);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["flip-monitor", "plain", "--start", "-5", "-d", "3"]).unwrap();
        match cli.command {
            Commands::Plain { clock, duration } => {
                assert_eq!(clock.start, Some(-5.0));
                assert_eq!(duration, Some(3));
            }
            _ => panic!("expected plain"),
        }

        assert!(Cli::try_parse_from(["flip-monitor", "run", "--start", "1", "--start-now"]).is_err());
    }
}
