//! End-to-end evaluation pipeline.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::consensus::GroupAggregator;
use crate::domain::foundation::{CriterionId, EngineError, EvaluatorId};
use crate::domain::hierarchy::{CriterionTree, HierarchyComposer, LocalPriorities, NodeKind};
use crate::domain::judgment::{Comparison, MatrixBuilder};
use crate::domain::priority::{
    rank_items, rank_permutation, DerivationMethod, PrioritySolver, PriorityVector,
    DEFAULT_CONSISTENCY_THRESHOLD,
};
use crate::domain::sensitivity::SensitivityAnalyzer;
use crate::engine::{
    EvaluationOutcome, EvaluationRequest, EvaluatorResult, GroupResult, MatrixKind, MatrixSummary,
};

/// One matrix in the evaluation: a parent node together with the kind
/// of items compared under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MatrixSlot {
    parent: CriterionId,
    kind: MatrixKind,
}

/// Per-evaluator state carried between the solve and assembly phases.
struct EvaluatorComputation {
    result: EvaluatorResult,
    final_scores: Vec<(CriterionId, f64)>,
    local: LocalPriorities,
}

/// The end-to-end AHP computation pipeline.
///
/// One call validates the criteria tree, assembles and solves every
/// comparison matrix per evaluator, composes global weights, aggregates
/// a panel into a group result, and optionally runs a sensitivity
/// sweep. The engine holds no state between calls; identical requests
/// produce identical outcomes.
pub struct Engine;

impl Engine {
    /// Runs one full evaluation.
    ///
    /// # Errors
    ///
    /// - [`EngineError::IncompleteHierarchy`] for a malformed tree or
    ///   comparisons referencing nodes outside it
    /// - [`EngineError::MalformedComparison`] /
    ///   [`EngineError::DuplicateComparison`] for invalid judgments
    /// - [`EngineError::InsufficientEvaluators`] when no comparisons
    ///   were submitted at all
    /// - [`EngineError::InvalidEvaluatorWeight`] for bad importance
    ///   entries in a multi-evaluator request
    /// - [`EngineError::InvalidSensitivityRange`] for an invalid sweep
    ///   request
    ///
    /// High consistency ratios and unjudged pairs are not errors; they
    /// are reported in the outcome.
    pub fn evaluate(request: &EvaluationRequest) -> Result<EvaluationOutcome, EngineError> {
        let tree = CriterionTree::from_records(request.criteria_tree.clone())?;

        let mut by_evaluator: BTreeMap<EvaluatorId, BTreeMap<MatrixSlot, Vec<Comparison>>> =
            BTreeMap::new();
        for comparison in &request.comparisons {
            let slot = Self::resolve_slot(&tree, comparison)?;
            by_evaluator
                .entry(comparison.evaluator_id.clone())
                .or_default()
                .entry(slot)
                .or_default()
                .push(comparison.clone());
        }
        if by_evaluator.is_empty() {
            return Err(EngineError::InsufficientEvaluators);
        }

        let slots = Self::matrix_slots(&tree, &by_evaluator);
        let threshold = request
            .consistency_threshold
            .unwrap_or(DEFAULT_CONSISTENCY_THRESHOLD);
        let solver = PrioritySolver::with_threshold(threshold);

        debug!(
            evaluators = by_evaluator.len(),
            matrices = slots.len(),
            threshold,
            "Partitioned comparisons into matrix slots"
        );

        let mut computations = Vec::with_capacity(by_evaluator.len());
        for (evaluator_id, submitted) in &by_evaluator {
            computations.push(Self::evaluate_one(
                &tree,
                &slots,
                &solver,
                evaluator_id,
                submitted,
            )?);
        }

        let importance = request.evaluator_weights.as_ref();
        let (group, ranking) = if computations.len() >= 2 {
            let vectors: BTreeMap<EvaluatorId, BTreeMap<CriterionId, f64>> = computations
                .iter()
                .map(|computation| {
                    (
                        computation.result.evaluator_id.clone(),
                        computation.final_scores.iter().copied().collect(),
                    )
                })
                .collect();
            let consensus = GroupAggregator::aggregate(&vectors, importance)?;

            debug!(
                consensus_index = consensus.diagnostics.consensus_index,
                outliers = consensus.diagnostics.outliers.len(),
                "Aggregated group result"
            );

            let scored: Vec<(CriterionId, f64)> = consensus
                .weights
                .iter()
                .map(|(&id, &weight)| (id, weight))
                .collect();
            let ranking = rank_items(&scored);
            (
                Some(GroupResult {
                    weights: consensus.weights,
                    consensus: consensus.diagnostics,
                }),
                ranking,
            )
        } else {
            (None, rank_items(&computations[0].final_scores))
        };

        let sensitivity = match &request.sensitivity {
            Some(spec) => {
                let local = Self::sensitivity_model(&computations, importance)?;
                let run = SensitivityAnalyzer::analyze(&tree, &local, spec)?;
                debug!(
                    target_criterion_id = %run.target_criterion_id,
                    steps = run.steps.len(),
                    reversal = run.rank_reversal_at.is_some(),
                    "Completed sensitivity sweep"
                );
                Some(run)
            }
            None => None,
        };

        let per_evaluator: Vec<EvaluatorResult> = computations
            .into_iter()
            .map(|computation| computation.result)
            .collect();

        Ok(EvaluationOutcome {
            per_evaluator,
            group,
            ranking,
            sensitivity,
        })
    }

    /// Solves every matrix for one evaluator and composes the result.
    fn evaluate_one(
        tree: &CriterionTree,
        slots: &[MatrixSlot],
        solver: &PrioritySolver,
        evaluator_id: &EvaluatorId,
        submitted: &BTreeMap<MatrixSlot, Vec<Comparison>>,
    ) -> Result<EvaluatorComputation, EngineError> {
        let mut local = LocalPriorities::default();
        let mut matrices = Vec::with_capacity(slots.len());

        for &slot in slots {
            let builder = MatrixBuilder::new(Self::slot_items(tree, slot));
            let comparisons = submitted.get(&slot).map(Vec::as_slice).unwrap_or(&[]);
            let matrix = builder.build(comparisons)?;
            let vector = solver.solve(&matrix);

            if vector.method == DerivationMethod::GeometricMean {
                debug!(
                    evaluator_id = %evaluator_id,
                    parent_node_id = %slot.parent,
                    "Eigenvector did not converge, using geometric-mean weights"
                );
            }

            matrices.push(MatrixSummary {
                parent_node_id: slot.parent,
                kind: slot.kind,
                complete: matrix.is_complete(),
                missing_pairs: matrix.missing_pairs(),
                consistency_ratio: vector.consistency_ratio,
                lambda_max: vector.lambda_max,
                is_consistent: vector.is_consistent,
                method: vector.method,
            });
            match slot.kind {
                MatrixKind::Criteria => {
                    local.criteria.insert(slot.parent, vector);
                }
                MatrixKind::Alternatives => {
                    local.alternatives.insert(slot.parent, vector);
                }
            }
        }

        let globals = HierarchyComposer::compose(tree, &local)?;
        let final_scores = HierarchyComposer::final_scores(tree, &globals, &local)?;

        let mut weights = globals.all().clone();
        if !tree.alternatives().is_empty() {
            for &(item, score) in &final_scores {
                weights.insert(item, score);
            }
        }

        // The evaluator-level figures summarize the worst matrix by CR.
        let worst = matrices.iter().max_by(|a, b| {
            a.consistency_ratio
                .partial_cmp(&b.consistency_ratio)
                .unwrap_or(Ordering::Equal)
        });
        let (consistency_ratio, is_consistent, method) = match worst {
            Some(summary) => (
                summary.consistency_ratio,
                summary.is_consistent,
                summary.method,
            ),
            None => (0.0, true, DerivationMethod::Eigenvector),
        };
        let complete = matrices.iter().all(|summary| summary.complete);

        debug!(
            evaluator_id = %evaluator_id,
            consistency_ratio,
            complete,
            "Solved and composed evaluator model"
        );

        Ok(EvaluatorComputation {
            result: EvaluatorResult {
                evaluator_id: evaluator_id.clone(),
                weights,
                consistency_ratio,
                is_consistent,
                method,
                complete,
                matrices,
            },
            final_scores,
            local,
        })
    }

    /// Resolves the matrix a comparison belongs to.
    ///
    /// With an explicit `parent_node_id` the comparison scopes that
    /// node's children, or the alternative set when the node is a leaf
    /// criterion. Without one, the slot is inferred: a criterion
    /// endpoint compares its parent's children, and an alternative
    /// endpoint is unambiguous only in a single-leaf tree.
    fn resolve_slot(
        tree: &CriterionTree,
        comparison: &Comparison,
    ) -> Result<MatrixSlot, EngineError> {
        if let Some(parent_id) = comparison.parent_node_id {
            let parent = tree.node(parent_id).ok_or_else(|| {
                EngineError::incomplete_hierarchy(format!(
                    "comparison scoped to {} which is not in the criteria tree",
                    parent_id
                ))
            })?;
            if parent.kind != NodeKind::Criterion {
                return Err(EngineError::malformed_comparison(format!(
                    "parent node {} is an alternative and has no children to compare",
                    parent_id
                )));
            }
            if tree.is_leaf(parent_id) {
                if tree.alternatives().is_empty() {
                    return Err(EngineError::malformed_comparison(format!(
                        "comparison under leaf criterion {} but the tree has no alternatives",
                        parent_id
                    )));
                }
                return Ok(MatrixSlot {
                    parent: parent_id,
                    kind: MatrixKind::Alternatives,
                });
            }
            return Ok(MatrixSlot {
                parent: parent_id,
                kind: MatrixKind::Criteria,
            });
        }

        let left = tree.node(comparison.left_id).ok_or_else(|| {
            EngineError::incomplete_hierarchy(format!(
                "comparison references {} which is not in the criteria tree",
                comparison.left_id
            ))
        })?;
        match left.kind {
            NodeKind::Criterion => {
                let parent = tree.parent_of(left.id).ok_or_else(|| {
                    EngineError::malformed_comparison(format!(
                        "criterion {} is the root and cannot be pairwise compared",
                        left.id
                    ))
                })?;
                Ok(MatrixSlot {
                    parent: parent.id,
                    kind: MatrixKind::Criteria,
                })
            }
            NodeKind::Alternative => {
                let leaves = tree.leaf_criteria();
                if leaves.len() == 1 {
                    Ok(MatrixSlot {
                        parent: leaves[0].id,
                        kind: MatrixKind::Alternatives,
                    })
                } else {
                    Err(EngineError::malformed_comparison(format!(
                        "alternative comparison needs an explicit parent_node_id in a tree \
                         with {} leaf criteria",
                        leaves.len()
                    )))
                }
            }
        }
    }

    /// Returns every matrix the evaluation covers: one per node with
    /// two or more children and one per leaf criterion when
    /// alternatives exist, in depth-first pre-order, followed by any
    /// further slots the submission touched, in id order.
    fn matrix_slots(
        tree: &CriterionTree,
        by_evaluator: &BTreeMap<EvaluatorId, BTreeMap<MatrixSlot, Vec<Comparison>>>,
    ) -> Vec<MatrixSlot> {
        let has_alternatives = !tree.alternatives().is_empty();
        let mut slots = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            let children = tree.children_of(node.id);
            if children.is_empty() {
                if has_alternatives {
                    slots.push(MatrixSlot {
                        parent: node.id,
                        kind: MatrixKind::Alternatives,
                    });
                }
                continue;
            }
            if children.len() >= 2 {
                slots.push(MatrixSlot {
                    parent: node.id,
                    kind: MatrixKind::Criteria,
                });
            }
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }

        let mut extras: Vec<MatrixSlot> = by_evaluator
            .values()
            .flat_map(|submitted| submitted.keys().copied())
            .filter(|slot| !slots.contains(slot))
            .collect();
        extras.sort_unstable();
        extras.dedup();
        slots.extend(extras);
        slots
    }

    /// Returns the ordered items a slot's matrix is defined over.
    fn slot_items(tree: &CriterionTree, slot: MatrixSlot) -> Vec<CriterionId> {
        match slot.kind {
            MatrixKind::Criteria => tree
                .children_of(slot.parent)
                .iter()
                .map(|child| child.id)
                .collect(),
            MatrixKind::Alternatives => tree
                .alternatives()
                .iter()
                .map(|alternative| alternative.id)
                .collect(),
        }
    }

    /// Local model the sensitivity sweep perturbs: the single
    /// evaluator's own vectors, or their per-matrix weighted geometric
    /// mean for a panel.
    fn sensitivity_model(
        computations: &[EvaluatorComputation],
        importance: Option<&BTreeMap<EvaluatorId, f64>>,
    ) -> Result<LocalPriorities, EngineError> {
        if computations.len() == 1 {
            return Ok(computations[0].local.clone());
        }

        let evaluators: Vec<&EvaluatorId> = computations
            .iter()
            .map(|computation| &computation.result.evaluator_id)
            .collect();
        let alphas = GroupAggregator::normalized_importance(&evaluators, importance)?;

        // Every evaluator was solved over the same slots, so the first
        // computation's keys cover the whole model.
        let mut pooled = LocalPriorities::default();
        for node in computations[0].local.criteria.keys() {
            let vectors = Self::vectors_at(computations, *node, MatrixKind::Criteria)?;
            pooled
                .criteria
                .insert(*node, Self::pooled_vector(&vectors, &alphas));
        }
        for node in computations[0].local.alternatives.keys() {
            let vectors = Self::vectors_at(computations, *node, MatrixKind::Alternatives)?;
            pooled
                .alternatives
                .insert(*node, Self::pooled_vector(&vectors, &alphas));
        }
        Ok(pooled)
    }

    fn vectors_at(
        computations: &[EvaluatorComputation],
        node: CriterionId,
        kind: MatrixKind,
    ) -> Result<Vec<&PriorityVector>, EngineError> {
        computations
            .iter()
            .map(|computation| {
                let vectors = match kind {
                    MatrixKind::Criteria => &computation.local.criteria,
                    MatrixKind::Alternatives => &computation.local.alternatives,
                };
                vectors.get(&node).ok_or_else(|| {
                    EngineError::incomplete_hierarchy(format!(
                        "no priority vector for node {} in evaluator {}'s model",
                        node, computation.result.evaluator_id
                    ))
                })
            })
            .collect()
    }

    /// Pools parallel evaluator vectors by weighted geometric mean.
    ///
    /// The pooled vector carries neutral consistency fields since no
    /// single matrix produced it; solved weights are strictly positive,
    /// so the logs are well defined.
    fn pooled_vector(vectors: &[&PriorityVector], alphas: &[f64]) -> PriorityVector {
        let n = vectors[0].weights.len();
        let mut weights: Vec<f64> = (0..n)
            .map(|k| {
                vectors
                    .iter()
                    .zip(alphas)
                    .map(|(vector, alpha)| alpha * vector.weights[k].ln())
                    .sum::<f64>()
                    .exp()
            })
            .collect();
        let sum: f64 = weights.iter().sum();
        for weight in &mut weights {
            *weight /= sum;
        }
        let rank = rank_permutation(&weights);
        PriorityVector {
            weights,
            rank,
            lambda_max: 0.0,
            consistency_ratio: 0.0,
            method: DerivationMethod::GeometricMean,
            is_consistent: true,
        }
    }
}
