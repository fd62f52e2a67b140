//! Error types for the AHP engine.

use thiserror::Error;

use super::{CriterionId, EvaluatorId};

/// Errors surfaced to the caller by engine operations.
///
/// Every failure is deterministic: identical input always produces the
/// identical error, so nothing here is worth retrying. Conditions the
/// engine tolerates, such as an inconsistent matrix or an unjudged
/// pair, are reported as result data instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Comparison value out of the Saaty range, unknown item ids, or a
    /// self-comparison claiming anything other than equality.
    #[error("malformed comparison: {reason}")]
    MalformedComparison { reason: String },

    /// The same unordered pair was judged twice with conflicting values
    /// by the same evaluator. Last-write-wins is deliberately not
    /// applied; the conflict must be resolved at the data-entry layer.
    #[error("conflicting judgments for pair ({left}, {right}): {first} vs {second}")]
    DuplicateComparison {
        left: CriterionId,
        right: CriterionId,
        first: f64,
        second: f64,
    },

    /// The criteria tree is malformed, or comparisons reference nodes
    /// outside it. No partial result is returned.
    #[error("incomplete hierarchy: {reason}")]
    IncompleteHierarchy { reason: String },

    /// Sensitivity parameters outside their valid domain.
    #[error("invalid sensitivity request: {reason}")]
    InvalidSensitivityRange { reason: String },

    /// An evaluator importance weight that is negative or non-finite.
    #[error("invalid importance weight {value} for evaluator '{evaluator_id}'")]
    InvalidEvaluatorWeight {
        evaluator_id: EvaluatorId,
        value: f64,
    },

    /// Group computation requested without any evaluator judgments.
    #[error("at least one evaluator is required")]
    InsufficientEvaluators,
}

impl EngineError {
    /// Creates a malformed comparison error.
    pub fn malformed_comparison(reason: impl Into<String>) -> Self {
        EngineError::MalformedComparison {
            reason: reason.into(),
        }
    }

    /// Creates a duplicate comparison error for a conflicting pair.
    pub fn duplicate_comparison(
        left: CriterionId,
        right: CriterionId,
        first: f64,
        second: f64,
    ) -> Self {
        EngineError::DuplicateComparison {
            left,
            right,
            first,
            second,
        }
    }

    /// Creates an incomplete hierarchy error.
    pub fn incomplete_hierarchy(reason: impl Into<String>) -> Self {
        EngineError::IncompleteHierarchy {
            reason: reason.into(),
        }
    }

    /// Creates an invalid sensitivity request error.
    pub fn invalid_sensitivity(reason: impl Into<String>) -> Self {
        EngineError::InvalidSensitivityRange {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the caller's API layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MalformedComparison { .. } => "MALFORMED_COMPARISON",
            EngineError::DuplicateComparison { .. } => "DUPLICATE_COMPARISON",
            EngineError::IncompleteHierarchy { .. } => "INCOMPLETE_HIERARCHY",
            EngineError::InvalidSensitivityRange { .. } => "INVALID_SENSITIVITY_RANGE",
            EngineError::InvalidEvaluatorWeight { .. } => "INVALID_EVALUATOR_WEIGHT",
            EngineError::InsufficientEvaluators => "INSUFFICIENT_EVALUATORS",
        }
    }
}
