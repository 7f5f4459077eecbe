//! # Space - Axis Ranges and Points
//!
//! Substrate neurons live in a box spanned by three configurable axis
//! ranges. Layout code works in unit coordinates (`[0, 1]` on every axis)
//! and translates into the configured ranges before anything reaches the
//! pattern network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed interval for one spatial axis
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound
    pub start: f64,

    /// Upper bound
    pub end: f64,
}

impl AxisRange {
    /// The unit interval `[0, 1]`
    pub const UNIT: AxisRange = AxisRange { start: 0.0, end: 1.0 };

    /// Create a new range
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Width of the range (`end - start`)
    #[inline]
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Map a unit-interval value into this range
    #[inline]
    pub fn translate_from_unit(&self, u: f64) -> f64 {
        self.start + u * self.span()
    }

    /// Map a value in this range back onto the unit interval
    ///
    /// A degenerate range maps everything to `0`.
    #[inline]
    pub fn translate_to_unit(&self, v: f64) -> f64 {
        let span = self.span();
        if span == 0.0 {
            0.0
        } else {
            (v - self.start) / span
        }
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::UNIT
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Coordinates of a single substrate neuron
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Translate a unit-space point into the given axis ranges
    pub fn translated_from_unit(self, rx: &AxisRange, ry: &AxisRange, rz: &AxisRange) -> Self {
        Self {
            x: rx.translate_from_unit(self.x),
            y: ry.translate_from_unit(self.y),
            z: rz.translate_from_unit(self.z),
        }
    }

    /// Translate a range-space point back into unit space
    pub fn translated_to_unit(self, rx: &AxisRange, ry: &AxisRange, rz: &AxisRange) -> Self {
        Self {
            x: rx.translate_to_unit(self.x),
            y: ry.translate_to_unit(self.y),
            z: rz.translate_to_unit(self.z),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
