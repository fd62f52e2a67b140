//! Pairwise comparison records submitted by evaluators.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CriterionId, EvaluatorId};

/// A single pairwise judgment as received from the caller.
///
/// Immutable once submitted: the engine never rewrites or reconciles
/// records, it only validates them during matrix construction. The raw
/// `value` is kept as a plain number here so that malformed submissions
/// reach the builder and fail with a proper validation error instead of
/// dying in deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub evaluator_id: EvaluatorId,
    /// Node whose children are being compared. When absent, the engine
    /// infers it from the items' shared parent in the criteria tree.
    #[serde(default)]
    pub parent_node_id: Option<CriterionId>,
    pub left_id: CriterionId,
    pub right_id: CriterionId,
    /// Intensity in [1/9, 9]: how strongly the left item is preferred.
    pub value: f64,
}

impl Comparison {
    /// Creates a comparison with no explicit parent node.
    pub fn new(
        evaluator_id: EvaluatorId,
        left_id: CriterionId,
        right_id: CriterionId,
        value: f64,
    ) -> Self {
        Self {
            evaluator_id,
            parent_node_id: None,
            left_id,
            right_id,
            value,
        }
    }

    /// Creates a comparison scoped to an explicit parent node.
    pub fn with_parent(
        evaluator_id: EvaluatorId,
        parent_node_id: CriterionId,
        left_id: CriterionId,
        right_id: CriterionId,
        value: f64,
    ) -> Self {
        Self {
            evaluator_id,
            parent_node_id: Some(parent_node_id),
            left_id,
            right_id,
            value,
        }
    }

    /// Returns the compared pair in id order, ignoring direction.
    pub fn unordered_pair(&self) -> (CriterionId, CriterionId) {
        if self.left_id <= self.right_id {
            (self.left_id, self.right_id)
        } else {
            (self.right_id, self.left_id)
        }
    }
}
