//! Weighted geometric-mean aggregation across evaluators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::consensus::rank_statistics::{kendalls_w, mean_spearman_rho};
use crate::domain::foundation::{CriterionId, EngineError, EvaluatorId};
use crate::domain::priority::rank_permutation;

/// Coefficient of variation above which an item counts as contested.
const DISAGREEMENT_CV: f64 = 0.5;

/// An evaluator whose distance from the group exceeds
/// `mean + OUTLIER_SIGMA * stddev` is flagged.
const OUTLIER_SIGMA: f64 = 2.0;

/// Spread statistics over fewer evaluators than this say nothing, so
/// outlier detection stays silent.
const MIN_OUTLIER_EVALUATORS: usize = 3;

/// Weights are floored here before the log so a single evaluator's zero
/// cannot annihilate an item in the geometric mean.
const WEIGHT_FLOOR: f64 = 1e-12;

/// Agreement diagnostics for a group of evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusDiagnostics {
    /// Kendall's coefficient of concordance over evaluator rankings,
    /// in [0, 1].
    pub kendalls_w: f64,
    /// Mean pairwise Spearman correlation, in [-1, 1].
    pub mean_spearman_rho: f64,
    /// Composite agreement score in [0, 1], monotonic in both W and
    /// mean rho.
    pub consensus_index: f64,
    /// Evaluators whose weight vectors sit unusually far from the
    /// group vector, sorted by id.
    pub outliers: Vec<EvaluatorId>,
    /// Per item, whether evaluator weights spread beyond the accepted
    /// coefficient of variation.
    pub disagreement: BTreeMap<CriterionId, bool>,
}

/// Group weights plus agreement diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub weights: BTreeMap<CriterionId, f64>,
    pub diagnostics: ConsensusDiagnostics,
}

/// Aggregates per-evaluator weight vectors into one group vector.
pub struct GroupAggregator;

impl GroupAggregator {
    /// Aggregates evaluator weight vectors by weighted geometric mean,
    /// the standard AHP convention for ratio-scale weights.
    ///
    /// # Algorithm
    ///
    /// 1. Normalize evaluator importance. Evaluators absent from the
    ///    importance map default to 1; importance entries for unknown
    ///    evaluators are ignored.
    /// 2. `group[k] = exp(Σ_e α_e · ln w_e[k])`, renormalized to sum 1.
    /// 3. Rank every evaluator's vector and derive Kendall's W, mean
    ///    pairwise Spearman rho, and the composite consensus index
    ///    `(W + (rho + 1) / 2) / 2`.
    /// 4. Flag outlier evaluators by Euclidean distance from the group
    ///    vector and contested items by per-item coefficient of
    ///    variation.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InsufficientEvaluators`] with no evaluators
    /// - [`EngineError::IncompleteHierarchy`] when evaluators cover
    ///   different item sets
    /// - [`EngineError::InvalidEvaluatorWeight`] for a non-finite or
    ///   non-positive importance entry
    pub fn aggregate(
        vectors: &BTreeMap<EvaluatorId, BTreeMap<CriterionId, f64>>,
        importance: Option<&BTreeMap<EvaluatorId, f64>>,
    ) -> Result<ConsensusResult, EngineError> {
        let Some(first) = vectors.values().next() else {
            return Err(EngineError::InsufficientEvaluators);
        };
        let items: Vec<CriterionId> = first.keys().copied().collect();

        let mut evaluators = Vec::with_capacity(vectors.len());
        let mut value_rows = Vec::with_capacity(vectors.len());
        for (evaluator, vector) in vectors {
            if vector.len() != items.len() {
                return Err(EngineError::incomplete_hierarchy(format!(
                    "evaluator {} weights cover a different item set",
                    evaluator
                )));
            }
            let mut row = Vec::with_capacity(items.len());
            for id in &items {
                let weight = vector.get(id).copied().ok_or_else(|| {
                    EngineError::incomplete_hierarchy(format!(
                        "evaluator {} weights cover a different item set",
                        evaluator
                    ))
                })?;
                row.push(weight);
            }
            evaluators.push(evaluator);
            value_rows.push(row);
        }

        let alphas = Self::normalized_importance(&evaluators, importance)?;

        let mut group: Vec<f64> = (0..items.len())
            .map(|k| {
                value_rows
                    .iter()
                    .zip(&alphas)
                    .map(|(row, alpha)| alpha * row[k].max(WEIGHT_FLOOR).ln())
                    .sum::<f64>()
                    .exp()
            })
            .collect();
        let sum: f64 = group.iter().sum();
        for value in &mut group {
            *value /= sum;
        }

        let ranks: Vec<Vec<usize>> = value_rows.iter().map(|row| rank_permutation(row)).collect();
        let w = kendalls_w(&ranks);
        let rho = mean_spearman_rho(&ranks);
        let consensus_index = ((w + (rho + 1.0) / 2.0) / 2.0).clamp(0.0, 1.0);

        let outliers = Self::flag_outliers(&evaluators, &value_rows, &group);
        let disagreement = Self::flag_disagreement(&items, &value_rows);

        let weights = items.iter().copied().zip(group.iter().copied()).collect();
        Ok(ConsensusResult {
            weights,
            diagnostics: ConsensusDiagnostics {
                kendalls_w: w,
                mean_spearman_rho: rho,
                consensus_index,
                outliers,
                disagreement,
            },
        })
    }

    /// Normalizes evaluator importance into fractions summing to 1.
    /// Absent entries default to 1.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidEvaluatorWeight`] for a non-finite
    /// or non-positive entry.
    pub(crate) fn normalized_importance(
        evaluators: &[&EvaluatorId],
        importance: Option<&BTreeMap<EvaluatorId, f64>>,
    ) -> Result<Vec<f64>, EngineError> {
        let mut alphas = Vec::with_capacity(evaluators.len());
        for evaluator in evaluators {
            let raw = importance
                .and_then(|map| map.get(*evaluator))
                .copied()
                .unwrap_or(1.0);
            if !raw.is_finite() || raw <= 0.0 {
                return Err(EngineError::InvalidEvaluatorWeight {
                    evaluator_id: (*evaluator).clone(),
                    value: raw,
                });
            }
            alphas.push(raw);
        }
        let total: f64 = alphas.iter().sum();
        for alpha in &mut alphas {
            *alpha /= total;
        }
        Ok(alphas)
    }

    fn flag_outliers(
        evaluators: &[&EvaluatorId],
        rows: &[Vec<f64>],
        group: &[f64],
    ) -> Vec<EvaluatorId> {
        if rows.len() < MIN_OUTLIER_EVALUATORS {
            return Vec::new();
        }
        let distances: Vec<f64> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(group)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();
        let m = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / m;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / m;
        let threshold = mean + OUTLIER_SIGMA * variance.sqrt();

        evaluators
            .iter()
            .zip(&distances)
            .filter(|(_, &distance)| distance > threshold)
            .map(|(evaluator, _)| (*evaluator).clone())
            .collect()
    }

    fn flag_disagreement(
        items: &[CriterionId],
        rows: &[Vec<f64>],
    ) -> BTreeMap<CriterionId, bool> {
        let m = rows.len() as f64;
        items
            .iter()
            .enumerate()
            .map(|(k, id)| {
                let mean = rows.iter().map(|row| row[k]).sum::<f64>() / m;
                let variance =
                    rows.iter().map(|row| (row[k] - mean).powi(2)).sum::<f64>() / m;
                let contested = mean > 0.0 && variance.sqrt() / mean > DISAGREEMENT_CV;
                (*id, contested)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(name: &str) -> EvaluatorId {
        EvaluatorId::new(name).unwrap()
    }

    fn weight_map(ids: &[CriterionId], weights: &[f64]) -> BTreeMap<CriterionId, f64> {
        ids.iter().copied().zip(weights.iter().copied()).collect()
    }

    fn items(n: usize) -> Vec<CriterionId> {
        (0..n).map(|_| CriterionId::new()).collect()
    }

    #[test]
    fn identical_vectors_reproduce_the_individual_vector() {
        let ids = items(3);
        let shared = weight_map(&ids, &[0.5, 0.3, 0.2]);
        let vectors: BTreeMap<_, _> = (0..3)
            .map(|k| (evaluator(&format!("e{}", k)), shared.clone()))
            .collect();

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        for (id, weight) in &shared {
            assert!((result.weights[id] - weight).abs() < 1e-12);
        }
        assert!((result.diagnostics.kendalls_w - 1.0).abs() < 1e-12);
        assert!((result.diagnostics.mean_spearman_rho - 1.0).abs() < 1e-12);
        assert!((result.diagnostics.consensus_index - 1.0).abs() < 1e-12);
        assert!(result.diagnostics.outliers.is_empty());
        assert!(result.diagnostics.disagreement.values().all(|flag| !flag));
    }

    #[test]
    fn importance_shifts_group_toward_heavier_evaluator() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("heavy"), weight_map(&ids, &[0.8, 0.2]));
        vectors.insert(evaluator("light"), weight_map(&ids, &[0.2, 0.8]));
        let mut importance = BTreeMap::new();
        importance.insert(evaluator("heavy"), 3.0);
        importance.insert(evaluator("light"), 1.0);

        let result = GroupAggregator::aggregate(&vectors, Some(&importance)).unwrap();
        // 0.8^0.75 · 0.2^0.25 against 0.2^0.75 · 0.8^0.25 is exactly 2:1.
        let ratio = result.weights[&ids[0]] / result.weights[&ids[1]];
        assert!((ratio - 2.0).abs() < 1e-9);
        let sum: f64 = result.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn equal_importance_matches_unweighted_aggregation() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.7, 0.3]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.4, 0.6]));
        let importance: BTreeMap<_, _> =
            [(evaluator("a"), 2.0), (evaluator("b"), 2.0)].into();

        let weighted = GroupAggregator::aggregate(&vectors, Some(&importance)).unwrap();
        let unweighted = GroupAggregator::aggregate(&vectors, None).unwrap();
        for id in &ids {
            assert!((weighted.weights[id] - unweighted.weights[id]).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_importance_entries_default_to_one() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.7, 0.3]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.4, 0.6]));
        let partial: BTreeMap<_, _> = [(evaluator("a"), 1.0)].into();

        let with_partial = GroupAggregator::aggregate(&vectors, Some(&partial)).unwrap();
        let with_none = GroupAggregator::aggregate(&vectors, None).unwrap();
        for id in &ids {
            assert!((with_partial.weights[id] - with_none.weights[id]).abs() < 1e-12);
        }
    }

    #[test]
    fn importance_for_unknown_evaluators_is_ignored() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.7, 0.3]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.4, 0.6]));
        let stray: BTreeMap<_, _> = [(evaluator("nobody"), 99.0)].into();

        let with_stray = GroupAggregator::aggregate(&vectors, Some(&stray)).unwrap();
        let without = GroupAggregator::aggregate(&vectors, None).unwrap();
        for id in &ids {
            assert!((with_stray.weights[id] - without.weights[id]).abs() < 1e-12);
        }
    }

    #[test]
    fn non_positive_importance_is_rejected() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.7, 0.3]));

        for bad in [0.0, -1.0, f64::NAN] {
            let importance: BTreeMap<_, _> = [(evaluator("a"), bad)].into();
            let err = GroupAggregator::aggregate(&vectors, Some(&importance)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidEvaluatorWeight { .. }));
        }
    }

    #[test]
    fn zero_weight_does_not_annihilate_an_item() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[1.0, 0.0]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.5, 0.5]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert!(result.weights[&ids[1]] > 0.0);
        let sum: f64 = result.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_evaluators_is_a_hard_error() {
        let err = GroupAggregator::aggregate(&BTreeMap::new(), None).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientEvaluators));
    }

    #[test]
    fn mismatched_item_sets_are_rejected() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.7, 0.3]));
        vectors.insert(
            evaluator("b"),
            weight_map(&[ids[0], CriterionId::new()], &[0.4, 0.6]),
        );

        let err = GroupAggregator::aggregate(&vectors, None).unwrap_err();
        assert!(matches!(err, EngineError::IncompleteHierarchy { .. }));
    }

    #[test]
    fn distant_evaluator_is_flagged_as_outlier() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        for k in 0..9 {
            vectors.insert(evaluator(&format!("e{}", k)), weight_map(&ids, &[0.5, 0.5]));
        }
        vectors.insert(evaluator("stray"), weight_map(&ids, &[0.9, 0.1]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert_eq!(result.diagnostics.outliers, vec![evaluator("stray")]);
    }

    #[test]
    fn outlier_detection_needs_three_evaluators() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.9, 0.1]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.1, 0.9]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert!(result.diagnostics.outliers.is_empty());
    }

    #[test]
    fn wide_spread_items_are_flagged_as_contested() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.9, 0.1]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.1, 0.9]));
        vectors.insert(evaluator("c"), weight_map(&ids, &[0.5, 0.5]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert!(result.diagnostics.disagreement[&ids[0]]);
        assert!(result.diagnostics.disagreement[&ids[1]]);
    }

    #[test]
    fn tight_spread_items_are_not_contested() {
        let ids = items(2);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.52, 0.48]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.48, 0.52]));
        vectors.insert(evaluator("c"), weight_map(&ids, &[0.50, 0.50]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert!(result.diagnostics.disagreement.values().all(|flag| !flag));
    }

    #[test]
    fn consensus_index_stays_in_unit_interval_under_discord() {
        let ids = items(3);
        let mut vectors = BTreeMap::new();
        vectors.insert(evaluator("a"), weight_map(&ids, &[0.6, 0.3, 0.1]));
        vectors.insert(evaluator("b"), weight_map(&ids, &[0.1, 0.6, 0.3]));
        vectors.insert(evaluator("c"), weight_map(&ids, &[0.3, 0.1, 0.6]));

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        assert!(result.diagnostics.kendalls_w.abs() < 1e-12);
        let index = result.diagnostics.consensus_index;
        assert!((0.0..=1.0).contains(&index));
    }

    #[test]
    fn single_evaluator_aggregates_to_itself() {
        let ids = items(3);
        let own = weight_map(&ids, &[0.5, 0.3, 0.2]);
        let vectors: BTreeMap<_, _> = [(evaluator("solo"), own.clone())].into();

        let result = GroupAggregator::aggregate(&vectors, None).unwrap();
        for (id, weight) in &own {
            assert!((result.weights[id] - weight).abs() < 1e-12);
        }
        assert_eq!(result.diagnostics.consensus_index, 1.0);
    }
}
