//! Elapsed-time decomposition into display fields

use crate::SECONDS_PER_YEAR;
use serde::{Deserialize, Serialize};
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// One display field, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Years,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Field {
    /// All fields, largest unit first
    pub const ALL: [Field; 5] =
        [Field::Years, Field::Days, Field::Hours, Field::Minutes, Field::Seconds];

    /// Short key (`y`, `d`, `h`, `m`, `s`)
    pub fn key(self) -> char {
        match self {
            Field::Years => 'y',
            Field::Days => 'd',
            Field::Hours => 'h',
            Field::Minutes => 'm',
            Field::Seconds => 's',
        }
    }

    /// Position of the field in display order
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Years => "years",
            Field::Days => "days",
            Field::Hours => "hours",
            Field::Minutes => "minutes",
            Field::Seconds => "seconds",
        };
        f.write_str(name)
    }
}

/// Elapsed time split into whole years, days, hours, minutes and seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockValues {
    pub years: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl ClockValues {
    /// Value of one field
    pub fn get(&self, field: Field) -> u64 {
        match field {
            Field::Years => self.years,
            Field::Days => self.days,
            Field::Hours => self.hours,
            Field::Minutes => self.minutes,
            Field::Seconds => self.seconds,
        }
    }

    /// Seconds represented by the fields, using the same unit sizes as [`decompose`]
    pub fn total_seconds(&self) -> f64 {
        self.years as f64 * SECONDS_PER_YEAR
            + self.days as f64 * SECONDS_PER_DAY
            + self.hours as f64 * SECONDS_PER_HOUR
            + self.minutes as f64 * SECONDS_PER_MINUTE
            + self.seconds as f64
    }
}

impl fmt::Display for ClockValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}y {}d {}h {}m {}s",
            self.years, self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Split `now - start` into display fields.
///
/// Units are taken greedily from the largest down, each floored and subtracted from
/// the remainder. A start in the future (or a non-finite difference) clamps to zero.
/// No field is capped; fitting values into their display width is the formatter's job.
pub fn decompose(now_seconds: f64, start_seconds: f64) -> ClockValues {
    // f64::max discards NaN
    let mut remainder = (now_seconds - start_seconds).max(0.0);

    let mut take = |unit: f64| -> u64 {
        let whole = (remainder / unit).floor();
        remainder = (remainder - whole * unit).max(0.0);
        whole as u64
    };

    let years = take(SECONDS_PER_YEAR);
    let days = take(SECONDS_PER_DAY);
    let hours = take(SECONDS_PER_HOUR);
    let minutes = take(SECONDS_PER_MINUTE);
    let seconds = remainder.floor() as u64;

    ClockValues { years, days, hours, minutes, seconds }
}
