//! Typed request accepted by one evaluation call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::EvaluatorId;
use crate::domain::hierarchy::Criterion;
use crate::domain::judgment::Comparison;
use crate::domain::sensitivity::SensitivityRequest;

/// Everything one evaluation call consumes.
///
/// The caller owns request parsing, authentication, and persistence;
/// the engine only validates and computes. Optional fields fall back to
/// the conventional AHP settings when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub criteria_tree: Vec<Criterion>,
    pub comparisons: Vec<Comparison>,
    /// Relative importance per evaluator for group aggregation.
    /// Evaluators are weighted equally when absent.
    #[serde(default)]
    pub evaluator_weights: Option<BTreeMap<EvaluatorId, f64>>,
    /// Consistency acceptance threshold, 0.1 when absent.
    #[serde(default)]
    pub consistency_threshold: Option<f64>,
    /// What-if sweep to run on the evaluated model.
    #[serde(default)]
    pub sensitivity: Option<SensitivityRequest>,
}

impl EvaluationRequest {
    /// Creates a request with default settings.
    pub fn new(criteria_tree: Vec<Criterion>, comparisons: Vec<Comparison>) -> Self {
        Self {
            criteria_tree,
            comparisons,
            evaluator_weights: None,
            consistency_threshold: None,
            sensitivity: None,
        }
    }

    /// Attaches evaluator importance weights.
    pub fn with_evaluator_weights(mut self, weights: BTreeMap<EvaluatorId, f64>) -> Self {
        self.evaluator_weights = Some(weights);
        self
    }

    /// Overrides the consistency acceptance threshold.
    pub fn with_consistency_threshold(mut self, threshold: f64) -> Self {
        self.consistency_threshold = Some(threshold);
        self
    }

    /// Requests a sensitivity sweep alongside the evaluation.
    pub fn with_sensitivity(mut self, sensitivity: SensitivityRequest) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }
}
