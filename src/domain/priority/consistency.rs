//! Consistency metrics for reciprocal comparison matrices.

/// Saaty's Random Index, indexed by matrix size. Sizes above ten reuse
/// the last entry.
const RANDOM_INDEX: [f64; 11] = [
    0.0, 0.0, 0.0, 0.52, 0.89, 1.11, 1.25, 1.35, 1.40, 1.45, 1.49,
];

/// Returns the Random Index for a matrix of size `n`.
pub fn random_index(n: usize) -> f64 {
    RANDOM_INDEX[n.min(RANDOM_INDEX.len() - 1)]
}

/// Computes the consistency index `(lambda_max - n) / (n - 1)`.
///
/// For a reciprocal matrix `lambda_max >= n`; round-off can dip a hair
/// below, so the index is clamped at zero. Size 1 has no off-diagonal
/// judgments and is defined as perfectly consistent.
pub fn consistency_index(lambda_max: f64, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    ((lambda_max - n as f64) / (n as f64 - 1.0)).max(0.0)
}

/// Computes the consistency ratio `CI / RI[n]`.
///
/// Matrices of size 2 or smaller cannot be inconsistent (their Random
/// Index is zero) and report a ratio of zero.
pub fn consistency_ratio(lambda_max: f64, n: usize) -> f64 {
    let ri = random_index(n);
    if ri == 0.0 {
        return 0.0;
    }
    consistency_index(lambda_max, n) / ri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_index_matches_saaty_table() {
        assert_eq!(random_index(1), 0.0);
        assert_eq!(random_index(2), 0.0);
        assert_eq!(random_index(3), 0.52);
        assert_eq!(random_index(4), 0.89);
        assert_eq!(random_index(10), 1.49);
    }

    #[test]
    fn random_index_clamps_above_ten() {
        assert_eq!(random_index(11), 1.49);
        assert_eq!(random_index(40), 1.49);
    }

    #[test]
    fn consistency_index_for_exact_lambda() {
        let ci = consistency_index(4.12, 4);
        assert!((ci - 0.04).abs() < 1e-12);
    }

    #[test]
    fn consistency_index_clamps_round_off_below_n() {
        assert_eq!(consistency_index(3.0 - 1e-12, 3), 0.0);
    }

    #[test]
    fn consistency_index_of_size_one_is_zero() {
        assert_eq!(consistency_index(1.0, 1), 0.0);
    }

    #[test]
    fn consistency_ratio_is_zero_for_small_matrices() {
        assert_eq!(consistency_ratio(2.0, 2), 0.0);
        assert_eq!(consistency_ratio(1.0, 1), 0.0);
    }

    #[test]
    fn consistency_ratio_divides_by_random_index() {
        let cr = consistency_ratio(4.12, 4);
        assert!((cr - 0.04 / 0.89).abs() < 1e-12);
    }
}
