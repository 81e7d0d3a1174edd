//! Fixed-width digit formatting

use crate::config::{FieldWidths, OverflowPolicy};
use crate::decompose::{ClockValues, Field};
use std::fmt;

/// Left-pad a digit string with `'0'` up to `width`.
///
/// Width is a minimum: longer input comes back unchanged.
pub fn pad(digits: &str, width: usize) -> String {
    if digits.len() >= width {
        return digits.to_string();
    }
    let mut padded = "0".repeat(width - digits.len());
    padded.push_str(digits);
    padded
}

/// Render one field at exactly `width` digits.
///
/// Returns the digits and whether the value had to be squeezed by `policy`.
pub fn fit(value: u64, width: usize, policy: OverflowPolicy) -> (String, bool) {
    let padded = pad(&value.to_string(), width);
    if padded.len() <= width {
        return (padded, false);
    }
    let fitted = match policy {
        OverflowPolicy::Saturate => "9".repeat(width),
        OverflowPolicy::Truncate => padded[padded.len() - width..].to_string(),
    };
    (fitted, true)
}

/// Flat, fixed-length run of ASCII digits; index `i` always addresses the same rotor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigitSequence(String);

impl DigitSequence {
    /// All-zero sequence, the implicit "previous" state before the first render
    pub fn zeros(len: usize) -> Self {
        Self("0".repeat(len))
    }

    /// Build from a digit string
    pub fn from_digits(digits: &str) -> Option<Self> {
        digits.bytes().all(|b| b.is_ascii_digit()).then(|| Self(digits.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Digit at a position
    pub fn digit(&self, position: usize) -> Option<char> {
        self.0.as_bytes().get(position).map(|&b| b as char)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DigitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of [`format_values`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub digits: DigitSequence,

    /// Fields whose value did not fit their width
    pub overflowed: Vec<Field>,
}

/// Concatenate all fields, years first, into one digit sequence of `widths.total()` digits
pub fn format_values(values: &ClockValues, widths: &FieldWidths, policy: OverflowPolicy) -> Formatted {
    let mut digits = String::with_capacity(widths.total());
    let mut overflowed = Vec::new();

    for field in Field::ALL {
        let (text, overflow) = fit(values.get(field), widths.width(field), policy);
        if overflow {
            overflowed.push(field);
        }
        digits.push_str(&text);
    }

    Formatted { digits: DigitSequence(digits), overflowed }
}
