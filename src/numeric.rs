//! Consistency evidence
//!
//! Every consistency condition is an equality over whole-number counters
//! and fixed-precision monetary totals, so the verifier compares exact
//! decimals wherever the engine hands them back. Floating results are kept
//! apart as `Delta::Approx` and only ever compared against an explicit
//! tolerance.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Observed deviation from the expected zero of a condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// Exact integer or decimal deviation
    Exact(Decimal),
    /// Deviation reported by the engine as a float
    Approx(f64),
}

impl Delta {
    /// Zero exact delta
    pub const ZERO: Delta = Delta::Exact(Decimal::ZERO);

    /// Returns true when the delta counts as zero.
    ///
    /// Exact deltas ignore the tolerance. Approximate deltas pass when
    /// `|delta| <= tolerance`; NaN never passes.
    pub fn is_zero_within(&self, tolerance: f64) -> bool {
        match self {
            Delta::Exact(v) => v.is_zero(),
            Delta::Approx(v) => v.abs() <= tolerance,
        }
    }
}

impl From<i64> for Delta {
    fn from(v: i64) -> Self {
        Delta::Exact(Decimal::from(v))
    }
}

impl From<Decimal> for Delta {
    fn from(v: Decimal) -> Self {
        Delta::Exact(v)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Exact(v) => write!(f, "{}", v),
            Delta::Approx(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
