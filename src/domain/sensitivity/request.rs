//! Sensitivity-analysis request parameters.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CriterionId, EngineError};

/// Default perturbation range: ±10% of the target's local weight.
pub const DEFAULT_RANGE: f64 = 0.1;

/// Default number of perturbation samples across the range.
pub const DEFAULT_STEPS: usize = 20;

/// Caller parameters for one sensitivity sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRequest {
    /// The criterion whose local weight is perturbed.
    pub target_criterion_id: CriterionId,
    /// Perturbation range as a fraction of the target weight, in
    /// (0, 1].
    #[serde(default = "default_range")]
    pub range: f64,
    /// Number of samples across `[-range, +range]`, at least 2.
    #[serde(default = "default_steps")]
    pub steps: usize,
}

fn default_range() -> f64 {
    DEFAULT_RANGE
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

impl SensitivityRequest {
    /// Creates a request with default range and step count.
    pub fn new(target_criterion_id: CriterionId) -> Self {
        Self {
            target_criterion_id,
            range: DEFAULT_RANGE,
            steps: DEFAULT_STEPS,
        }
    }

    /// Overrides the perturbation range.
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    /// Overrides the sample count.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Validates the numeric parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSensitivityRange`] when the range
    /// falls outside (0, 1] or fewer than two steps are requested.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.range.is_finite() || self.range <= 0.0 || self.range > 1.0 {
            return Err(EngineError::invalid_sensitivity(format!(
                "perturbation range {} is outside (0, 1]",
                self.range
            )));
        }
        if self.steps < 2 {
            return Err(EngineError::invalid_sensitivity(format!(
                "step count {} must be at least 2",
                self.steps
            )));
        }
        Ok(())
    }
}
