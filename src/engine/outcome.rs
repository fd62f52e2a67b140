//! Typed result records returned by one evaluation call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::consensus::ConsensusDiagnostics;
use crate::domain::foundation::{CriterionId, EvaluatorId};
use crate::domain::priority::{DerivationMethod, RankedItem};
use crate::domain::sensitivity::SensitivityRun;

/// What a comparison matrix compares: sibling criteria under a shared
/// parent, or the alternative set under a leaf criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Criteria,
    Alternatives,
}

/// Consistency and completeness summary for one solved matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// Node whose children (or alternative set) the matrix compares.
    pub parent_node_id: CriterionId,
    pub kind: MatrixKind,
    /// False when at least one pair was never judged and stayed at the
    /// neutral value 1.
    pub complete: bool,
    pub missing_pairs: Vec<(CriterionId, CriterionId)>,
    pub consistency_ratio: f64,
    pub lambda_max: f64,
    pub is_consistent: bool,
    pub method: DerivationMethod,
}

/// One evaluator's solved model.
///
/// The top-level consistency figures summarize the worst matrix by
/// consistency ratio; `matrices` carries the per-matrix detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResult {
    pub evaluator_id: EvaluatorId,
    /// Global weight per criterion, plus the final score per
    /// alternative when the tree carries any.
    pub weights: BTreeMap<CriterionId, f64>,
    pub consistency_ratio: f64,
    pub is_consistent: bool,
    pub method: DerivationMethod,
    /// True when every matrix had all of its pairs judged.
    pub complete: bool,
    pub matrices: Vec<MatrixSummary>,
}

/// Aggregated group weights with agreement diagnostics. Produced only
/// for panels of two or more evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    pub weights: BTreeMap<CriterionId, f64>,
    pub consensus: ConsensusDiagnostics,
}

/// Complete result of one evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Per-evaluator results, sorted by evaluator id.
    pub per_evaluator: Vec<EvaluatorResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupResult>,
    /// Final ranking: the group's when present, otherwise the single
    /// evaluator's.
    pub ranking: Vec<RankedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityRun>,
}
