//! Perturbation sweeps over a composed hierarchy.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::foundation::{CriterionId, EngineError};
use crate::domain::hierarchy::{CriterionTree, HierarchyComposer, LocalPriorities, NodeKind};
use crate::domain::priority::{rank_items, rank_permutation, RankedItem};
use crate::domain::sensitivity::SensitivityRequest;

/// Ranking produced at one perturbation sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityStep {
    pub delta: f64,
    pub ranking: Vec<RankedItem>,
}

/// Outcome of one sensitivity sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRun {
    pub target_criterion_id: CriterionId,
    pub range: f64,
    pub step_count: usize,
    pub steps: Vec<SensitivityStep>,
    /// The perturbation of smallest magnitude at which the top item
    /// differs from the baseline, negative preferred on ties. `None`
    /// when the top never changes.
    pub rank_reversal_at: Option<f64>,
    /// Central-difference slope of the baseline top item's score with
    /// respect to the perturbation, taken at the two samples adjacent
    /// to zero.
    pub sensitivity_coefficient: f64,
    /// True when any sample had to be clipped into [0, 1].
    pub truncated: bool,
}

/// Sweeps a target criterion's local weight and re-ranks per sample.
pub struct SensitivityAnalyzer;

impl SensitivityAnalyzer {
    /// Runs a perturbation sweep for the requested target.
    ///
    /// # Algorithm
    ///
    /// For each `delta` evenly spaced over `[-range, +range]`:
    ///
    /// 1. Set the target's local weight to `w · (1 + delta)`, clipped
    ///    into [0, 1]; note the truncation when clipping bites.
    /// 2. Rescale the target's siblings by `(1 - new) / (1 - old)` so
    ///    the sibling set still sums to 1.
    /// 3. Recompose global weights, rescore, and re-rank.
    ///
    /// The sweep records where the top item first changes relative to
    /// the unperturbed baseline and the slope of the baseline top
    /// item's score at zero.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSensitivityRange`] for parameters
    /// outside their domain or a target that cannot be perturbed (not
    /// in the tree, an alternative, the root, no siblings, or already
    /// carrying the entire sibling weight), and
    /// [`EngineError::IncompleteHierarchy`] when the local model cannot
    /// be composed.
    pub fn analyze(
        tree: &CriterionTree,
        local: &LocalPriorities,
        request: &SensitivityRequest,
    ) -> Result<SensitivityRun, EngineError> {
        request.validate()?;

        let target = tree.node(request.target_criterion_id).ok_or_else(|| {
            EngineError::invalid_sensitivity(format!(
                "target criterion {} is not in the criteria tree",
                request.target_criterion_id
            ))
        })?;
        if target.kind != NodeKind::Criterion {
            return Err(EngineError::invalid_sensitivity(format!(
                "target {} is an alternative, not a criterion",
                target.id
            )));
        }
        let parent = tree.parent_of(target.id).ok_or_else(|| {
            EngineError::invalid_sensitivity(format!(
                "target criterion {} is the root and has no siblings",
                target.id
            ))
        })?;
        let siblings = tree.children_of(parent.id);
        if siblings.len() < 2 {
            return Err(EngineError::invalid_sensitivity(format!(
                "target criterion {} has no siblings to rebalance",
                target.id
            )));
        }
        let Some(position) = siblings.iter().position(|child| child.id == target.id) else {
            return Err(EngineError::incomplete_hierarchy(format!(
                "target criterion {} is missing from its parent's children",
                target.id
            )));
        };

        let baseline_globals = HierarchyComposer::compose(tree, local)?;
        let baseline_scored = HierarchyComposer::final_scores(tree, &baseline_globals, local)?;
        let baseline_top = rank_items(&baseline_scored)
            .first()
            .map(|entry| entry.item_id);

        let old = local
            .criteria
            .get(&parent.id)
            .and_then(|vector| vector.weights.get(position))
            .copied()
            .ok_or_else(|| {
                EngineError::incomplete_hierarchy(format!(
                    "no priority vector for node {} with {} children",
                    parent.id,
                    siblings.len()
                ))
            })?;
        if old >= 1.0 - f64::EPSILON {
            return Err(EngineError::invalid_sensitivity(format!(
                "target criterion {} already carries the entire sibling weight",
                target.id
            )));
        }

        let mut steps = Vec::with_capacity(request.steps);
        let mut truncated = false;
        for k in 0..request.steps {
            // Integer numerator keeps delta = 0 exact on odd step
            // counts and each pair of samples exactly symmetric.
            let numerator = 2 * k as i64 - (request.steps as i64 - 1);
            let delta = request.range * numerator as f64 / (request.steps - 1) as f64;

            let raw = old * (1.0 + delta);
            let clipped = raw.clamp(0.0, 1.0);
            if clipped != raw {
                truncated = true;
            }

            let perturbed = Self::perturb(local, parent.id, position, old, clipped);
            let globals = HierarchyComposer::compose(tree, &perturbed)?;
            let scored = HierarchyComposer::final_scores(tree, &globals, &perturbed)?;
            steps.push(SensitivityStep {
                delta,
                ranking: rank_items(&scored),
            });
        }

        let rank_reversal_at = Self::first_reversal(&steps, baseline_top);
        let sensitivity_coefficient = Self::slope_at_zero(&steps, baseline_top);

        Ok(SensitivityRun {
            target_criterion_id: target.id,
            range: request.range,
            step_count: request.steps,
            steps,
            rank_reversal_at,
            sensitivity_coefficient,
            truncated,
        })
    }

    /// Rebuilds the local model with the target at `new` and its
    /// siblings rescaled. Only the weights feed recomposition; the
    /// vector's rank is refreshed to stay coherent.
    fn perturb(
        local: &LocalPriorities,
        parent: CriterionId,
        position: usize,
        old: f64,
        new: f64,
    ) -> LocalPriorities {
        let scale = (1.0 - new) / (1.0 - old);
        let mut perturbed = local.clone();
        if let Some(vector) = perturbed.criteria.get_mut(&parent) {
            for (offset, weight) in vector.weights.iter_mut().enumerate() {
                *weight = if offset == position {
                    new
                } else {
                    *weight * scale
                };
            }
            vector.rank = rank_permutation(&vector.weights);
        }
        perturbed
    }

    fn first_reversal(steps: &[SensitivityStep], baseline_top: Option<CriterionId>) -> Option<f64> {
        let mut reversals: Vec<f64> = steps
            .iter()
            .filter(|step| step.ranking.first().map(|entry| entry.item_id) != baseline_top)
            .map(|step| step.delta)
            .collect();
        reversals.sort_by(|a, b| {
            a.abs()
                .partial_cmp(&b.abs())
                .unwrap_or(Ordering::Equal)
                .then(a.partial_cmp(b).unwrap_or(Ordering::Equal))
        });
        reversals.first().copied()
    }

    fn slope_at_zero(steps: &[SensitivityStep], baseline_top: Option<CriterionId>) -> f64 {
        let Some(top) = baseline_top else {
            return 0.0;
        };
        let mut below: Option<&SensitivityStep> = None;
        let mut above: Option<&SensitivityStep> = None;
        for step in steps {
            if step.delta < 0.0 && below.map_or(true, |b| step.delta > b.delta) {
                below = Some(step);
            }
            if step.delta > 0.0 && above.map_or(true, |a| step.delta < a.delta) {
                above = Some(step);
            }
        }
        match (below, above) {
            (Some(b), Some(a)) => {
                (Self::score_of(a, top) - Self::score_of(b, top)) / (a.delta - b.delta)
            }
            _ => 0.0,
        }
    }

    fn score_of(step: &SensitivityStep, item: CriterionId) -> f64 {
        step.ranking
            .iter()
            .find(|entry| entry.item_id == item)
            .map(|entry| entry.score)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::Criterion;
    use crate::domain::priority::{DerivationMethod, PriorityVector};

    fn criterion(parent: Option<CriterionId>, level: u32, order: u32) -> Criterion {
        Criterion::new(CriterionId::new(), parent, level, order, NodeKind::Criterion)
    }

    fn alternative(order: u32) -> Criterion {
        Criterion::new(CriterionId::new(), None, 0, order, NodeKind::Alternative)
    }

    fn vector(weights: Vec<f64>) -> PriorityVector {
        PriorityVector {
            rank: rank_permutation(&weights),
            weights,
            lambda_max: 0.0,
            consistency_ratio: 0.0,
            method: DerivationMethod::Eigenvector,
            is_consistent: true,
        }
    }

    struct Fixture {
        tree: CriterionTree,
        local: LocalPriorities,
        target: CriterionId,
        alternatives: Vec<CriterionId>,
    }

    /// Three criteria under the root plus two alternatives. The target
    /// is the heaviest criterion.
    fn fixture(criteria_weights: [f64; 3], alt_weights: [[f64; 2]; 3]) -> Fixture {
        let root = criterion(None, 0, 0);
        let c: Vec<Criterion> = (0..3).map(|k| criterion(Some(root.id), 1, k)).collect();
        let alts = vec![alternative(0), alternative(1)];
        let mut records = vec![root.clone()];
        records.extend(c.iter().cloned());
        records.extend(alts.iter().cloned());
        let tree = CriterionTree::from_records(records).unwrap();

        // Sibling order is (order, id); orders 0..3 are distinct, so the
        // construction order holds.
        let mut local = LocalPriorities::default();
        local
            .criteria
            .insert(root.id, vector(criteria_weights.to_vec()));
        for (node, weights) in c.iter().zip(alt_weights) {
            local.alternatives.insert(node.id, vector(weights.to_vec()));
        }
        let alternatives = tree.alternatives().iter().map(|alt| alt.id).collect();
        Fixture {
            tree,
            local,
            target: c[0].id,
            alternatives,
        }
    }

    #[test]
    fn baseline_sample_reproduces_unperturbed_ranking() {
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);
        let request = SensitivityRequest::new(f.target).with_steps(21);
        let run = SensitivityAnalyzer::analyze(&f.tree, &f.local, &request).unwrap();

        let globals = HierarchyComposer::compose(&f.tree, &f.local).unwrap();
        let scored = HierarchyComposer::final_scores(&f.tree, &globals, &f.local).unwrap();
        let baseline = rank_items(&scored);

        let middle = &run.steps[10];
        assert_eq!(middle.delta, 0.0);
        assert_eq!(middle.ranking, baseline);
    }

    #[test]
    fn coefficient_recovers_linear_slope() {
        // Top score is 0.62 + 0.18·delta, exactly linear in delta.
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);
        let request = SensitivityRequest::new(f.target);
        let run = SensitivityAnalyzer::analyze(&f.tree, &f.local, &request).unwrap();

        assert!((run.sensitivity_coefficient - 0.18).abs() < 1e-9);
        assert!(run.rank_reversal_at.is_none());
        assert!(!run.truncated);
        assert_eq!(run.steps.len(), 20);
    }

    #[test]
    fn reversal_reported_at_smallest_perturbation_that_flips_the_top() {
        // Scores are 0.52 + 0.28·delta and 0.48 - 0.28·delta; the top
        // flips below delta = -1/14, first reached at sample -15r/19.
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.2, 0.8], [0.3, 0.7]]);
        let request = SensitivityRequest::new(f.target);
        let run = SensitivityAnalyzer::analyze(&f.tree, &f.local, &request).unwrap();

        let at = run.rank_reversal_at.unwrap();
        assert!((at - (-15.0 * 0.1 / 19.0)).abs() < 1e-9);

        let flipped = run
            .steps
            .iter()
            .find(|step| (step.delta - at).abs() < 1e-12)
            .unwrap();
        assert_eq!(flipped.ranking[0].item_id, f.alternatives[1]);
    }

    #[test]
    fn clipping_is_noted_as_truncation() {
        let root = criterion(None, 0, 0);
        let c: Vec<Criterion> = (0..3).map(|k| criterion(Some(root.id), 1, k)).collect();
        let mut records = vec![root.clone()];
        records.extend(c.iter().cloned());
        let tree = CriterionTree::from_records(records).unwrap();

        let mut local = LocalPriorities::default();
        local
            .criteria
            .insert(root.id, vector(vec![0.92, 0.05, 0.03]));

        let request = SensitivityRequest::new(c[0].id);
        let run = SensitivityAnalyzer::analyze(&tree, &local, &request).unwrap();

        assert!(run.truncated);
        assert_eq!(run.steps.len(), 20);
        for step in &run.steps {
            let total: f64 = step.ranking.iter().map(|entry| entry.score).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn tree_without_alternatives_ranks_leaf_criteria() {
        let root = criterion(None, 0, 0);
        let c: Vec<Criterion> = (0..3).map(|k| criterion(Some(root.id), 1, k)).collect();
        let mut records = vec![root.clone()];
        records.extend(c.iter().cloned());
        let tree = CriterionTree::from_records(records).unwrap();

        let mut local = LocalPriorities::default();
        local.criteria.insert(root.id, vector(vec![0.5, 0.3, 0.2]));

        let request = SensitivityRequest::new(c[0].id).with_steps(4);
        let run = SensitivityAnalyzer::analyze(&tree, &local, &request).unwrap();

        assert!(run.rank_reversal_at.is_none());
        for step in &run.steps {
            let ids: Vec<CriterionId> =
                step.ranking.iter().map(|entry| entry.item_id).collect();
            assert!(c.iter().all(|node| ids.contains(&node.id)));
        }
    }

    #[test]
    fn rejects_target_outside_the_tree() {
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);
        let request = SensitivityRequest::new(CriterionId::new());
        let err = SensitivityAnalyzer::analyze(&f.tree, &f.local, &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));
    }

    #[test]
    fn rejects_root_and_alternative_targets() {
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);

        let root_request = SensitivityRequest::new(f.tree.root().id);
        let err = SensitivityAnalyzer::analyze(&f.tree, &f.local, &root_request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));

        let alt_request = SensitivityRequest::new(f.alternatives[0]);
        let err = SensitivityAnalyzer::analyze(&f.tree, &f.local, &alt_request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));
    }

    #[test]
    fn rejects_target_without_siblings() {
        let root = criterion(None, 0, 0);
        let only = criterion(Some(root.id), 1, 0);
        let x = criterion(Some(only.id), 2, 0);
        let y = criterion(Some(only.id), 2, 1);
        let tree = CriterionTree::from_records(vec![root, only.clone(), x, y]).unwrap();

        let mut local = LocalPriorities::default();
        local.criteria.insert(only.id, vector(vec![0.6, 0.4]));

        let request = SensitivityRequest::new(only.id);
        let err = SensitivityAnalyzer::analyze(&tree, &local, &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));
    }

    #[test]
    fn rejects_target_that_carries_all_weight() {
        let root = criterion(None, 0, 0);
        let a = criterion(Some(root.id), 1, 0);
        let b = criterion(Some(root.id), 1, 1);
        let tree = CriterionTree::from_records(vec![root.clone(), a.clone(), b]).unwrap();

        let mut local = LocalPriorities::default();
        local.criteria.insert(root.id, vector(vec![1.0, 0.0]));

        let request = SensitivityRequest::new(a.id);
        let err = SensitivityAnalyzer::analyze(&tree, &local, &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));
    }

    #[test]
    fn invalid_step_count_fails_before_any_computation() {
        let f = fixture([0.5, 0.3, 0.2], [[0.8, 0.2], [0.4, 0.6], [0.5, 0.5]]);
        let request = SensitivityRequest::new(f.target).with_steps(1);
        let err = SensitivityAnalyzer::analyze(&f.tree, &f.local, &request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSensitivityRange { .. }));
    }
}
