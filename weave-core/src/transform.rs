//! # Output Transform
//!
//! Turns a raw pattern-network output into a substrate weight bounded by
//! `[min, max]`, optionally zeroing everything whose magnitude is at or below
//! an expression threshold.
//!
//! ## Scaling by response bounds
//!
//! | network bounds | transform                              |
//! |----------------|----------------------------------------|
//! | `[0, 1]`       | `raw * range + min`                    |
//! | `[-1, 1]`      | `((raw + 1) / 2) * range + min`        |
//! | other          | `clamp(raw, min, max)`                 |
//!
//! After thresholding, the surviving values are stretched back so the
//! output still reaches `min` and `max` rather than jumping at the threshold.

use serde::{Deserialize, Serialize};

/// Known output range of a pattern network, captured once per session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBounds {
    /// Outputs in `[0, 1]`
    Unit,
    /// Outputs in `[-1, 1]`
    PlusMinusUnit,
    /// Anything else, outputs are clamped
    Other,
}

impl ResponseBounds {
    /// Classify a network's declared response range
    #[allow(clippy::float_cmp)]
    pub fn classify(min_response: f64, max_response: f64) -> Self {
        if min_response == 0.0 && max_response == 1.0 {
            Self::Unit
        } else if min_response == -1.0 && max_response == 1.0 {
            Self::PlusMinusUnit
        } else {
            Self::Other
        }
    }
}

/// Target range and threshold for substrate weights
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
    pub threshold: f64,
}

impl WeightBounds {
    pub fn new(min: f64, max: f64, threshold: f64) -> Self {
        Self { min, max, threshold }
    }

    /// `max - min`
    #[inline]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Thresholding divides by `max - threshold` and `min + threshold`
    pub fn threshold_is_safe(&self) -> bool {
        self.threshold <= 0.0 || (self.threshold < self.max && self.threshold < -self.min)
    }

    /// Apply [`ranged_output`] with these bounds
    #[inline]
    pub fn apply(&self, raw: f64, bounds: ResponseBounds) -> f64 {
        ranged_output(raw, bounds, self.min, self.max, self.range(), self.threshold)
    }
}

/// Convert a raw network output to a bounded, optionally thresholded value
///
/// Callers using a positive `threshold` must keep it below `max_value` and
/// below `-min_value`.
#[inline]
pub fn ranged_output(
    raw: f64,
    bounds: ResponseBounds,
    min_value: f64,
    max_value: f64,
    value_range: f64,
    threshold: f64,
) -> f64 {
    let output = match bounds {
        ResponseBounds::Unit => raw * value_range + min_value,
        ResponseBounds::PlusMinusUnit => ((raw + 1.0) * 0.5) * value_range + min_value,
        ResponseBounds::Other => raw.max(min_value).min(max_value),
    };

    if threshold > 0.0 {
        if output.abs() <= threshold {
            0.0
        } else if output > 0.0 {
            (output - threshold) * (max_value / (max_value - threshold))
        } else {
            (output + threshold) * (min_value / (min_value + threshold))
        }
    } else {
        output
    }
}
