//! Reciprocal pairwise-comparison matrix over an ordered sibling set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{CriterionId, EngineError};

/// Tolerance for validating reciprocal symmetry of caller-supplied rows.
/// Judgments entered as rounded decimals (0.33 for 1/3) must pass.
const RECIPROCAL_TOLERANCE: f64 = 1e-2;

/// Tolerance for the unit diagonal of caller-supplied rows.
const DIAGONAL_TOLERANCE: f64 = 1e-9;

/// A square reciprocal matrix of pairwise judgments.
///
/// Invariants held by construction: `m[i][i] == 1`, every entry is
/// positive, and `m[i][j] * m[j][i] == 1` for judged pairs. Pairs never
/// judged stay at the neutral 1 and are reported through
/// [`is_complete`](Self::is_complete) and
/// [`missing_pairs`](Self::missing_pairs) rather than treated as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    items: Vec<CriterionId>,
    /// Row-major n×n entries.
    entries: Vec<f64>,
    /// Index pairs (i, j) with i < j that carry an actual judgment.
    judged: BTreeSet<(usize, usize)>,
}

impl ComparisonMatrix {
    /// Creates an all-neutral matrix (every entry 1) over the given items.
    pub fn neutral(items: Vec<CriterionId>) -> Self {
        let n = items.len();
        let mut entries = vec![1.0; n * n];
        for i in 0..n {
            entries[i * n + i] = 1.0;
        }
        Self {
            items,
            entries,
            judged: BTreeSet::new(),
        }
    }

    /// Builds a matrix from explicit rows.
    ///
    /// Validates shape, a unit diagonal, positive finite entries, and
    /// reciprocal symmetry (within a tolerance that admits judgments
    /// entered as rounded decimals). Every off-diagonal pair of a
    /// row-built matrix counts as judged.
    pub fn from_rows(
        items: Vec<CriterionId>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, EngineError> {
        let n = items.len();
        if rows.len() != n {
            return Err(EngineError::malformed_comparison(format!(
                "expected {} matrix rows, got {}",
                n,
                rows.len()
            )));
        }

        let mut entries = vec![1.0; n * n];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::malformed_comparison(format!(
                    "matrix row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(EngineError::malformed_comparison(format!(
                        "matrix entry [{}][{}] = {} must be a positive number",
                        i, j, value
                    )));
                }
                entries[i * n + j] = value;
            }
        }

        for i in 0..n {
            if (entries[i * n + i] - 1.0).abs() > DIAGONAL_TOLERANCE {
                return Err(EngineError::malformed_comparison(format!(
                    "matrix diagonal entry [{}][{}] must be 1",
                    i, i
                )));
            }
            for j in (i + 1)..n {
                let product = entries[i * n + j] * entries[j * n + i];
                if (product - 1.0).abs() > RECIPROCAL_TOLERANCE {
                    return Err(EngineError::malformed_comparison(format!(
                        "entries [{}][{}] and [{}][{}] are not reciprocal",
                        i, j, j, i
                    )));
                }
            }
        }

        let judged = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        Ok(Self {
            items,
            entries,
            judged,
        })
    }

    /// Returns the matrix dimension.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Returns the ordered sibling items the matrix is defined over.
    pub fn items(&self) -> &[CriterionId] {
        &self.items
    }

    /// Returns the entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.entries[i * self.items.len() + j]
    }

    /// Returns row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.items.len();
        &self.entries[i * n..(i + 1) * n]
    }

    /// Records a judged value for the pair, maintaining reciprocity.
    pub(crate) fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < j, "pairs are stored in normalized orientation");
        let n = self.items.len();
        self.entries[i * n + j] = value;
        self.entries[j * n + i] = 1.0 / value;
        self.judged.insert((i, j));
    }

    /// Returns true if the pair (in either orientation) was judged.
    pub(crate) fn is_judged(&self, i: usize, j: usize) -> bool {
        let key = if i < j { (i, j) } else { (j, i) };
        self.judged.contains(&key)
    }

    /// Returns true if every off-diagonal pair carries a judgment.
    pub fn is_complete(&self) -> bool {
        let n = self.items.len();
        self.judged.len() == n * (n - 1) / 2 || n < 2
    }

    /// Returns the pairs that were never judged, in item order.
    pub fn missing_pairs(&self) -> Vec<(CriterionId, CriterionId)> {
        let n = self.items.len();
        let mut missing = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.judged.contains(&(i, j)) {
                    missing.push((self.items[i], self.items[j]));
                }
            }
        }
        missing
    }
}
