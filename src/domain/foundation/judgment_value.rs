//! Judgment value object for the Saaty comparison scale.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EngineError;

/// Tolerance applied at the scale boundaries so that values computed as
/// reciprocals (e.g. 1.0 / 9.0) survive round-tripping.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// A pairwise comparison intensity on the Saaty scale.
///
/// Valid values are rationals in [1/9, 9]: 1 means the two items matter
/// equally, 9 means the left item is extremely preferred, and values
/// below 1 express the reciprocal (preference for the right item).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Judgment(f64);

impl Judgment {
    /// Smallest admissible intensity (extreme preference for the right item).
    pub const MIN: f64 = 1.0 / 9.0;

    /// Largest admissible intensity (extreme preference for the left item).
    pub const MAX: f64 = 9.0;

    /// Equal importance.
    pub const EQUAL: Self = Self(1.0);

    /// Moderate preference for the left item.
    pub const MODERATE: Self = Self(3.0);

    /// Strong preference for the left item.
    pub const STRONG: Self = Self(5.0);

    /// Very strong preference for the left item.
    pub const VERY_STRONG: Self = Self(7.0);

    /// Extreme preference for the left item.
    pub const EXTREME: Self = Self(9.0);

    /// Creates a Judgment, returning error if the value is not finite or
    /// falls outside [1/9, 9].
    pub fn try_new(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::malformed_comparison(format!(
                "comparison value {} is not a finite number",
                value
            )));
        }
        if value < Self::MIN - BOUNDARY_EPSILON || value > Self::MAX + BOUNDARY_EPSILON {
            return Err(EngineError::malformed_comparison(format!(
                "comparison value {} is outside the Saaty range [1/9, 9]",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Returns the raw intensity.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the same judgment seen from the other item's side.
    pub fn reciprocal(&self) -> Self {
        Self(1.0 / self.0)
    }

    /// Returns true if the judgment favors the right-hand item.
    pub fn favors_right(&self) -> bool {
        self.0 < 1.0
    }

    /// Returns the display label for the judgment's intensity band.
    ///
    /// The label describes magnitude only; direction comes from
    /// [`favors_right`](Self::favors_right).
    pub fn label(&self) -> &'static str {
        let magnitude = if self.0 >= 1.0 { self.0 } else { 1.0 / self.0 };
        match magnitude {
            m if m < 2.0 => "equal importance",
            m if m < 4.0 => "moderate importance",
            m if m < 6.0 => "strong importance",
            m if m < 8.0 => "very strong importance",
            _ => "extreme importance",
        }
    }
}

impl From<Judgment> for f64 {
    fn from(judgment: Judgment) -> Self {
        judgment.0
    }
}

impl TryFrom<f64> for Judgment {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
