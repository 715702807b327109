//! Rate and duration arithmetic with explicit not-applicable results.

use serde::{Serialize, Serializer};
use std::fmt;

/// Text rendered for [`Metric::NotApplicable`].
pub const NOT_APPLICABLE: &str = "N/A";

/// A reported number that may legitimately be absent.
///
/// `Missing` comes from an unclosed interval (a null endpoint) and renders as `null`;
/// `NotApplicable` comes from a zero denominator or a measure the ticket type does
/// not have, and renders as `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Missing,
    NotApplicable,
}

impl From<Option<f64>> for Metric {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Metric::Missing, Metric::Value)
    }
}

impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            Metric::Missing => serializer.serialize_none(),
            Metric::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}", v),
            Metric::Missing => f.write_str("-"),
            Metric::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// `numerator / denominator` rounded half away from zero to two decimals, computed on
/// integers so decimal halves such as 1.005 round up.
pub fn round2_ratio(numerator: i128, denominator: i128) -> f64 {
    debug_assert!(denominator > 0);
    let scaled = numerator.abs() * 100;
    let hundredths = (2 * scaled + denominator) / (2 * denominator);
    let signed = if numerator < 0 { -hundredths } else { hundredths };
    signed as f64 / 100.0
}

/// `numerator / denominator * 100`, rounded to two decimals. A zero (or negative)
/// denominator is not applicable rather than a division.
pub fn percentage(numerator: i64, denominator: i64) -> Metric {
    if denominator <= 0 {
        return Metric::NotApplicable;
    }
    Metric::Value(round2_ratio(i128::from(numerator) * 100, i128::from(denominator)))
}

/// Whole seconds to minutes, rounded to two decimals. `None` propagates.
pub fn minutes(seconds: Option<i64>) -> Option<f64> {
    seconds.map(|s| round2_ratio(i128::from(s), 60))
}

/// Running sum/count/max over an optional per-row duration, ignoring nulls the way SQL
/// `AVG`/`MAX` do.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationStats {
    sum: i64,
    n: i64,
    max: Option<i64>,
}

impl DurationStats {
    pub fn push(&mut self, seconds: Option<i64>) {
        if let Some(s) = seconds {
            self.sum += s;
            self.n += 1;
            self.max = Some(self.max.map_or(s, |m| m.max(s)));
        }
    }

    /// Mean minutes, rounded from the exact `sum / (60 * n)` ratio.
    pub fn avg_minutes(&self) -> Metric {
        if self.n == 0 {
            return Metric::Missing;
        }
        Metric::Value(round2_ratio(i128::from(self.sum), i128::from(self.n) * 60))
    }

    pub fn max_minutes(&self) -> Metric {
        minutes(self.max).into()
    }
}
