//! Priority vector derived from one comparison matrix.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Method that produced a priority vector's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationMethod {
    /// Principal eigenvector, refined by power iteration.
    Eigenvector,
    /// Row geometric mean, used when power iteration does not converge.
    GeometricMean,
}

/// Normalized priority weights over one sibling set, with consistency
/// diagnostics.
///
/// Weights are non-negative and sum to 1. `rank` is a permutation of
/// 1..=n with rank 1 for the highest weight; equal weights keep their
/// original item order. Vectors are produced once per matrix and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityVector {
    pub weights: Vec<f64>,
    pub rank: Vec<usize>,
    pub lambda_max: f64,
    pub consistency_ratio: f64,
    pub method: DerivationMethod,
    pub is_consistent: bool,
}

/// Assigns 1-based ranks by descending value.
///
/// Ties are broken by original position, so the result is always a
/// permutation of 1..=n and identical inputs yield identical ranks.
pub fn rank_permutation(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut rank = vec![0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        rank[index] = position + 1;
    }
    rank
}
