//! Weight derivation for a single comparison matrix.

use crate::domain::judgment::ComparisonMatrix;
use crate::domain::priority::consistency;
use crate::domain::priority::{rank_permutation, DerivationMethod, PriorityVector};

/// Conventional upper bound on an acceptable consistency ratio.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.1;

/// Iteration cap that bounds work on pathological matrices.
const MAX_POWER_ITERATIONS: usize = 100;

/// Sup-norm convergence tolerance for power iteration.
const CONVERGENCE_EPSILON: f64 = 1e-10;

/// Consecutive iterations of a growing residual before the iteration is
/// declared oscillating and abandoned.
const OSCILLATION_RUN: usize = 3;

/// Derives normalized priority weights from a reciprocal matrix.
///
/// The solver never rejects an inconsistent matrix: it reports the
/// consistency ratio and an `is_consistent` flag against its threshold
/// and leaves the decision to the caller.
#[derive(Debug, Clone)]
pub struct PrioritySolver {
    threshold: f64,
}

impl PrioritySolver {
    /// Creates a solver with the conventional 0.1 consistency threshold.
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_CONSISTENCY_THRESHOLD,
        }
    }

    /// Creates a solver with a caller-chosen consistency threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Returns the configured consistency threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Derives the priority vector for a matrix.
    ///
    /// # Algorithm
    ///
    /// 1. Start from column-normalized row means.
    /// 2. Refine by power iteration (`w' = normalize(M·w)`) until the
    ///    sup-norm change drops below 1e-10 or 100 iterations elapse.
    /// 3. Estimate `lambda_max` as the mean of `(M·w)_i / w_i`.
    /// 4. Derive CI and CR from `lambda_max` and the Random Index table.
    ///
    /// If the iteration oscillates, exceeds its cap, or produces a
    /// non-positive dominant eigenvalue, the solver falls back to the
    /// row geometric mean and tags the result `geometric_mean`. The
    /// fallback is a recovery, not an error.
    pub fn solve(&self, matrix: &ComparisonMatrix) -> PriorityVector {
        let n = matrix.size();
        if n == 0 {
            return PriorityVector {
                weights: Vec::new(),
                rank: Vec::new(),
                lambda_max: 0.0,
                consistency_ratio: 0.0,
                method: DerivationMethod::Eigenvector,
                is_consistent: true,
            };
        }

        let eigen = Self::power_iterate(matrix).and_then(|weights| {
            let lambda_max = Self::lambda_max(matrix, &weights);
            (lambda_max.is_finite() && lambda_max > 0.0).then_some((weights, lambda_max))
        });

        let (weights, lambda_max, method) = match eigen {
            Some((weights, lambda_max)) => (weights, lambda_max, DerivationMethod::Eigenvector),
            None => {
                let weights = Self::geometric_mean_weights(matrix);
                let lambda_max = Self::lambda_max(matrix, &weights);
                (weights, lambda_max, DerivationMethod::GeometricMean)
            }
        };

        let consistency_ratio = consistency::consistency_ratio(lambda_max, n);
        PriorityVector {
            rank: rank_permutation(&weights),
            weights,
            lambda_max,
            consistency_ratio,
            method,
            is_consistent: consistency_ratio <= self.threshold,
        }
    }

    /// Runs power iteration to convergence; `None` signals the caller
    /// to fall back to the geometric mean.
    fn power_iterate(matrix: &ComparisonMatrix) -> Option<Vec<f64>> {
        let mut weights = Self::column_mean_estimate(matrix)?;
        let mut previous_delta = f64::INFINITY;
        let mut growth_run = 0usize;

        for _ in 0..MAX_POWER_ITERATIONS {
            let product = Self::multiply(matrix, &weights);
            let sum: f64 = product.iter().sum();
            if !sum.is_finite() || sum <= 0.0 {
                return None;
            }
            let next: Vec<f64> = product.iter().map(|value| value / sum).collect();
            if next.iter().any(|value| !value.is_finite()) {
                return None;
            }

            let delta = next
                .iter()
                .zip(&weights)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, f64::max);
            weights = next;

            if delta < CONVERGENCE_EPSILON {
                return Some(weights);
            }
            if delta > previous_delta {
                growth_run += 1;
                if growth_run >= OSCILLATION_RUN {
                    return None;
                }
            } else {
                growth_run = 0;
            }
            previous_delta = delta;
        }
        None
    }

    /// Column-normalized row means, the classic approximate eigenvector.
    fn column_mean_estimate(matrix: &ComparisonMatrix) -> Option<Vec<f64>> {
        let n = matrix.size();
        let mut column_sums = vec![0.0; n];
        for i in 0..n {
            for (j, sum) in column_sums.iter_mut().enumerate() {
                *sum += matrix.get(i, j);
            }
        }
        if column_sums.iter().any(|sum| !sum.is_finite() || *sum <= 0.0) {
            return None;
        }

        let estimate = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| matrix.get(i, j) / column_sums[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();
        Some(estimate)
    }

    fn multiply(matrix: &ComparisonMatrix, weights: &[f64]) -> Vec<f64> {
        let n = matrix.size();
        (0..n)
            .map(|i| (0..n).map(|j| matrix.get(i, j) * weights[j]).sum())
            .collect()
    }

    /// Mean of the component-wise Rayleigh ratios `(M·w)_i / w_i`.
    fn lambda_max(matrix: &ComparisonMatrix, weights: &[f64]) -> f64 {
        let n = matrix.size();
        if n == 0 {
            return 0.0;
        }
        if weights.iter().any(|w| *w <= 0.0) {
            return f64::NAN;
        }
        let product = Self::multiply(matrix, weights);
        product
            .iter()
            .zip(weights)
            .map(|(p, w)| p / w)
            .sum::<f64>()
            / n as f64
    }

    /// Row geometric means in log space, normalized to sum 1.
    ///
    /// Log space keeps row products of large matrices away from
    /// overflow.
    fn geometric_mean_weights(matrix: &ComparisonMatrix) -> Vec<f64> {
        let n = matrix.size();
        let mut weights: Vec<f64> = (0..n)
            .map(|i| {
                let log_sum: f64 = matrix.row(i).iter().map(|value| value.ln()).sum();
                (log_sum / n as f64).exp()
            })
            .collect();
        let sum: f64 = weights.iter().sum();
        for weight in &mut weights {
            *weight /= sum;
        }
        weights
    }
}

impl Default for PrioritySolver {
    fn default() -> Self {
        Self::new()
    }
}
