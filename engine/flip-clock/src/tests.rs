//! Unit and property tests for FlipClock components

use std::time::Duration;

use crate::config::MonitoringConfig;
use crate::{
    decompose, format_values, pad, ClockValues, DigitSequence, DigitTable, FieldWidths,
    FlipConfig, FlipError, OverflowPolicy, TimerConfig, DEFAULT_FLIP_DELAY_MS,
    DEFAULT_TICK_INTERVAL_MS, DEFAULT_TRANSITION_MS,
};

fn create_test_config() -> FlipConfig {
    FlipConfig {
        timer: TimerConfig {
            start_epoch_seconds: Some(1_600_000_000.5),
            tick_interval_ms: 250,
            flip_delay_ms: 100,
            transition_ms: 100,
            overflow: OverflowPolicy::Truncate,
            field_widths: FieldWidths { years: 2, days: 3, hours: 2, minutes: 2, seconds: 2 },
        },
        monitoring: MonitoringConfig {
            emit_metrics: true,
            metrics_interval_ms: 1000,
            log_level: "debug".to_string(),
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_timer_config_default() {
        let config = TimerConfig::default();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.flip_delay_ms, DEFAULT_FLIP_DELAY_MS);
        assert_eq!(config.transition_ms, DEFAULT_TRANSITION_MS);
        assert_eq!(config.overflow, OverflowPolicy::Saturate);
        assert!(config.start_epoch_seconds.is_none());
    }

    #[test]
    fn test_timer_config_duration_conversion() {
        let config = TimerConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(1000));
        assert_eq!(MonitoringConfig::default().metrics_interval(), Duration::from_millis(10_000));
    }

    #[test]
    fn test_file_round_trip() {
        let config = create_test_config();
        let path = std::env::temp_dir().join(format!("flip-clock-{}.toml", std::process::id()));

        config.to_file(&path).unwrap();
        let loaded = FlipConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.timer, config.timer);
        assert_eq!(loaded.display, config.display);
        assert!(loaded.monitoring.emit_metrics);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FlipConfig::from_toml_str(
            r#"
            [timer]
            start_epoch_seconds = 1700000000

            [display]
            theme = "light"
            "#,
        )
        .unwrap();

        assert_eq!(config.timer.start_seconds().unwrap(), 1_700_000_000.0);
        assert_eq!(config.timer.field_widths, FieldWidths::default());
        assert_eq!(config.display.theme, "light");
        assert_eq!(config.display.target, "flipdown");
    }

    #[test]
    fn test_missing_start_is_reported_at_construction() {
        let config = FlipConfig::from_toml_str("[timer]\ntick_interval_ms = 500\n").unwrap();
        let err = config.timer.start_seconds().unwrap_err();
        assert!(matches!(err, FlipError::MissingStartTime));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_non_numeric_start_rejected() {
        let err = FlipConfig::from_toml_str("[timer]\nstart_epoch_seconds = \"yesterday\"\n")
            .unwrap_err();
        assert!(matches!(err, FlipError::ConfigParse(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let err = FlipConfig::from_toml_str("[timer]\ntick_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, FlipError::Config(_)));
    }

    #[test]
    fn test_huge_flip_delay_rejected() {
        let err = FlipConfig::from_toml_str("[timer]\nflip_delay_ms = 86400001\n")
            .unwrap_err();
        assert!(matches!(err, FlipError::Config(_)));
    }

    #[test]
    fn test_overflow_policy_names() {
        let config = FlipConfig::from_toml_str("[timer]\noverflow = \"truncate\"\n").unwrap();
        assert_eq!(config.timer.overflow, OverflowPolicy::Truncate);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FlipConfig::from_file("/nonexistent/flip.toml").unwrap_err();
        assert!(matches!(err, FlipError::ConfigFile { .. }));
    }
}

#[cfg(test)]
mod metrics_tests {
    use crate::metrics::MetricsCollector;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        let metrics = collector.get_metrics();

        assert_eq!(metrics.ticks_processed, 0);
        assert_eq!(metrics.flips_started, 0);
        assert_eq!(metrics.max_tick_duration_ns, 0);
    }

    #[test]
    fn test_metrics_recording() {
        let collector = MetricsCollector::new();

        collector.record_tick(Duration::from_micros(40), 3);
        collector.record_tick(Duration::from_micros(10), 1);
        collector.record_flip_started();
        collector.record_flip_started();
        collector.record_flip_settled();
        collector.record_cancelled(1);
        collector.record_overflow();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.ticks_processed, 2);
        assert_eq!(metrics.digits_changed, 4);
        assert_eq!(metrics.last_tick_duration_ns, 10_000);
        assert_eq!(metrics.max_tick_duration_ns, 40_000);
        assert_eq!(metrics.flips_started, 2);
        assert_eq!(metrics.flips_settled, 1);
        assert_eq!(metrics.tasks_cancelled, 1);
        assert_eq!(metrics.overflow_events, 1);
    }

    #[test]
    fn test_metrics_serialize() {
        let collector = MetricsCollector::new();
        collector.record_tick(Duration::from_millis(1), 2);

        let json = serde_json::to_value(collector.get_metrics()).unwrap();
        assert_eq!(json["ticks_processed"], 1);
        assert_eq!(json["digits_changed"], 2);
        assert!(json.get("uptime_seconds").is_some());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::SECONDS_PER_YEAR;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn reconstruction_within_one_second(elapsed in 0.0f64..2.0e10) {
            let values = decompose(elapsed, 0.0);
            let total = values.total_seconds();
            prop_assert!(total <= elapsed + 1e-6, "total {} > elapsed {}", total, elapsed);
            prop_assert!(elapsed - total < 1.0 + 1e-6, "total {} too far below {}", total, elapsed);
        }

        #[test]
        fn fields_stay_within_unit_bounds(elapsed in 0.0f64..2.0e10) {
            let values = decompose(elapsed, 0.0);
            prop_assert!(values.days <= 365);
            prop_assert!(values.hours < 24);
            prop_assert!(values.minutes < 60);
            prop_assert!(values.seconds < 60);
            prop_assert_eq!(values.years, (elapsed / SECONDS_PER_YEAR).floor() as u64);
        }

        #[test]
        fn future_start_is_all_zero(start in -1.0e9f64..1.0e10, ahead in 1.0e-3f64..1.0e9) {
            prop_assert_eq!(decompose(start - ahead, start), ClockValues::default());
        }

        #[test]
        fn padding_is_idempotent(value in any::<u64>(), width in 1usize..24) {
            let once = pad(&value.to_string(), width);
            prop_assert_eq!(pad(&once, width), once.clone());
            prop_assert!(once.len() >= width);
        }

        #[test]
        fn formatted_length_is_fixed(elapsed in 0.0f64..1.0e12, truncate in any::<bool>()) {
            let policy = if truncate { OverflowPolicy::Truncate } else { OverflowPolicy::Saturate };
            let widths = FieldWidths::default();
            let formatted = format_values(&decompose(elapsed, 0.0), &widths, policy);
            prop_assert_eq!(formatted.digits.len(), widths.total());
        }

        #[test]
        fn diff_flags_exactly_the_differences(a in "[0-9]{10}", b in "[0-9]{10}") {
            let mut table = DigitTable::new(&FieldWidths::default());
            table.diff(&DigitSequence::from_digits(&a).unwrap()).unwrap();
            let changes = table.diff(&DigitSequence::from_digits(&b).unwrap()).unwrap();

            for (i, (x, y)) in a.chars().zip(b.chars()).enumerate() {
                prop_assert_eq!(changes.is_changed(i), x != y);
            }
            let previous = table.previous();
            prop_assert_eq!(previous.as_str(), b.as_str());
        }
    }
}
