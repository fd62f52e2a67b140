//! Rank-agreement statistics over evaluator rankings.
//!
//! All functions take strict rank permutations (1..=n, no shared
//! ranks), which is what [`rank_permutation`] produces; the classic
//! formulas below are exact for that case and need no tie correction.
//!
//! [`rank_permutation`]: crate::domain::priority::rank_permutation

/// Kendall's coefficient of concordance W over an evaluators × items
/// rank matrix.
///
/// `W = 12S / (m²(n³ - n))` where S is the sum of squared deviations of
/// per-item rank sums from their mean. 1 means every evaluator ranks
/// identically, 0 means no agreement beyond chance. With zero or one
/// item there is nothing to disagree about and W is 1.
pub fn kendalls_w(ranks: &[Vec<usize>]) -> f64 {
    let m = ranks.len();
    if m == 0 {
        return 1.0;
    }
    let n = ranks[0].len();
    if n <= 1 {
        return 1.0;
    }

    let mut rank_sums = vec![0.0; n];
    for row in ranks {
        for (item, &rank) in row.iter().enumerate() {
            rank_sums[item] += rank as f64;
        }
    }
    let mean = m as f64 * (n as f64 + 1.0) / 2.0;
    let s: f64 = rank_sums.iter().map(|sum| (sum - mean).powi(2)).sum();
    let denominator = (m as f64).powi(2) * ((n as f64).powi(3) - n as f64);
    (12.0 * s / denominator).clamp(0.0, 1.0)
}

/// Spearman's rank correlation between two rankings of the same items.
///
/// `rho = 1 - 6 Σd² / (n(n² - 1))`, in [-1, 1]. Rankings of one item
/// or fewer correlate trivially at 1.
pub fn spearman_rho(a: &[usize], b: &[usize]) -> f64 {
    let n = a.len();
    if n <= 1 {
        return 1.0;
    }
    let d_squared: f64 = a
        .iter()
        .zip(b)
        .map(|(&ra, &rb)| {
            let d = ra as f64 - rb as f64;
            d * d
        })
        .sum();
    1.0 - 6.0 * d_squared / (n as f64 * ((n as f64).powi(2) - 1.0))
}

/// Mean of pairwise Spearman correlations across all evaluator pairs.
///
/// A single evaluator has no pairs and correlates with itself at 1.
pub fn mean_spearman_rho(ranks: &[Vec<usize>]) -> f64 {
    let m = ranks.len();
    if m <= 1 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..m {
        for j in (i + 1)..m {
            total += spearman_rho(&ranks[i], &ranks[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}
