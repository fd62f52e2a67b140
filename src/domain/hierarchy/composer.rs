//! Composition of local sibling weights into global priorities.

use std::collections::BTreeMap;

use crate::domain::foundation::{CriterionId, EngineError};
use crate::domain::hierarchy::CriterionTree;
use crate::domain::priority::PriorityVector;

/// Local weight vectors feeding composition must sum to 1 within this
/// tolerance.
const VECTOR_SUM_TOLERANCE: f64 = 1e-9;

/// Composed leaf weights must re-sum to 1 within this tolerance.
const LEAF_SUM_TOLERANCE: f64 = 1e-6;

/// Local priority vectors feeding one composition pass.
#[derive(Debug, Clone, Default)]
pub struct LocalPriorities {
    /// Per internal criterion, the vector over its direct children in
    /// sibling order.
    pub criteria: BTreeMap<CriterionId, PriorityVector>,
    /// Per leaf criterion, the vector over the full alternative set in
    /// alternative order.
    pub alternatives: BTreeMap<CriterionId, PriorityVector>,
}

/// Global weight of every criterion node, derived from one pass of
/// hierarchical composition. The root always carries weight 1.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalWeights {
    all: BTreeMap<CriterionId, f64>,
    leaves: Vec<(CriterionId, f64)>,
}

impl GlobalWeights {
    /// Returns the global weight of a node, if it is part of the tree.
    pub fn weight_of(&self, id: CriterionId) -> Option<f64> {
        self.all.get(&id).copied()
    }

    /// Returns every criterion's global weight, keyed by id.
    pub fn all(&self) -> &BTreeMap<CriterionId, f64> {
        &self.all
    }

    /// Returns the leaf criteria and their weights in depth-first
    /// pre-order. Leaf weights sum to 1.
    pub fn leaves(&self) -> &[(CriterionId, f64)] {
        &self.leaves
    }
}

/// Composes local priority vectors down the criteria tree.
pub struct HierarchyComposer;

impl HierarchyComposer {
    /// Computes global weights for every criterion node.
    ///
    /// # Algorithm
    ///
    /// Depth-first from the root with weight 1: each child's global
    /// weight is the parent's global weight times the child's local
    /// weight among its siblings. An only child inherits the parent
    /// weight unchanged, since a one-item sibling set needs no
    /// comparison. Leaf weights are validated to re-sum to 1 after the
    /// pass.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::IncompleteHierarchy`] when a node with
    /// two or more children has no local vector, a vector's length does
    /// not match the sibling count, a vector does not sum to 1, or the
    /// composed leaf weights fail their sum check.
    pub fn compose(
        tree: &CriterionTree,
        local: &LocalPriorities,
    ) -> Result<GlobalWeights, EngineError> {
        let mut all = BTreeMap::new();
        let mut leaves = Vec::new();
        let mut stack = vec![(tree.root_position(), 1.0_f64)];

        while let Some((position, global)) = stack.pop() {
            let node = tree.node_at(position);
            all.insert(node.id, global);

            let children = tree.child_positions(position);
            if children.is_empty() {
                leaves.push((node.id, global));
                continue;
            }
            if children.len() == 1 {
                stack.push((children[0], global));
                continue;
            }

            let vector = local.criteria.get(&node.id).ok_or_else(|| {
                EngineError::incomplete_hierarchy(format!(
                    "no priority vector for node {} with {} children",
                    node.id,
                    children.len()
                ))
            })?;
            Self::check_vector(vector, children.len(), node.id)?;
            // Reversed pushes keep the pop order in sibling order.
            for (offset, &child) in children.iter().enumerate().rev() {
                stack.push((child, global * vector.weights[offset]));
            }
        }

        let leaf_sum: f64 = leaves.iter().map(|(_, weight)| weight).sum();
        if (leaf_sum - 1.0).abs() > LEAF_SUM_TOLERANCE {
            return Err(EngineError::incomplete_hierarchy(format!(
                "composed leaf weights sum to {}, expected 1",
                leaf_sum
            )));
        }

        Ok(GlobalWeights { all, leaves })
    }

    /// Scores every alternative as the sum over leaf criteria of the
    /// leaf's global weight times the alternative's local weight under
    /// that leaf. Scores sum to 1 across alternatives.
    ///
    /// Returns an empty map when the tree carries no alternatives.
    pub fn score_alternatives(
        tree: &CriterionTree,
        globals: &GlobalWeights,
        local: &LocalPriorities,
    ) -> Result<BTreeMap<CriterionId, f64>, EngineError> {
        let alternatives = tree.alternatives();
        if alternatives.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut scores: BTreeMap<CriterionId, f64> =
            alternatives.iter().map(|alt| (alt.id, 0.0)).collect();
        for &(leaf, weight) in globals.leaves() {
            let vector = local.alternatives.get(&leaf).ok_or_else(|| {
                EngineError::incomplete_hierarchy(format!(
                    "no alternative priorities under leaf criterion {}",
                    leaf
                ))
            })?;
            Self::check_vector(vector, alternatives.len(), leaf)?;
            for (offset, alt) in alternatives.iter().enumerate() {
                if let Some(score) = scores.get_mut(&alt.id) {
                    *score += weight * vector.weights[offset];
                }
            }
        }
        Ok(scores)
    }

    /// Returns the items the final ranking covers, with their scores:
    /// alternatives in alternative order when the tree has any,
    /// otherwise the leaf criteria and their global weights.
    pub fn final_scores(
        tree: &CriterionTree,
        globals: &GlobalWeights,
        local: &LocalPriorities,
    ) -> Result<Vec<(CriterionId, f64)>, EngineError> {
        let alternatives = tree.alternatives();
        if alternatives.is_empty() {
            return Ok(globals.leaves().to_vec());
        }
        let scores = Self::score_alternatives(tree, globals, local)?;
        Ok(alternatives
            .iter()
            .map(|alt| (alt.id, scores.get(&alt.id).copied().unwrap_or(0.0)))
            .collect())
    }

    fn check_vector(
        vector: &PriorityVector,
        expected_len: usize,
        node: CriterionId,
    ) -> Result<(), EngineError> {
        if vector.weights.len() != expected_len {
            return Err(EngineError::incomplete_hierarchy(format!(
                "priority vector for {} covers {} items, expected {}",
                node,
                vector.weights.len(),
                expected_len
            )));
        }
        let sum: f64 = vector.weights.iter().sum();
        if (sum - 1.0).abs() > VECTOR_SUM_TOLERANCE {
            return Err(EngineError::incomplete_hierarchy(format!(
                "priority vector for {} sums to {}, expected 1",
                node, sum
            )));
        }
        Ok(())
    }
}
