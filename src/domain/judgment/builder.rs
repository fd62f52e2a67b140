//! Assembles validated reciprocal matrices from raw comparison records.

use std::collections::HashMap;

use crate::domain::foundation::{CriterionId, EngineError, Judgment};
use crate::domain::judgment::{Comparison, ComparisonMatrix};

/// Two judgments of the same pair must agree to within this tolerance
/// once normalized to the same orientation. Exact resubmissions pass;
/// contradictions fail.
const CONFLICT_TOLERANCE: f64 = 1e-9;

/// Builds a [`ComparisonMatrix`] from comparison records over a fixed
/// sibling set.
///
/// The builder owns the item order. Comparisons may arrive in either
/// orientation and are normalized before insertion, so "A over B = 3"
/// and "B over A = 1/3" describe the same judgment.
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    items: Vec<CriterionId>,
    index: HashMap<CriterionId, usize>,
}

impl MatrixBuilder {
    /// Creates a builder over the given sibling items, in matrix order.
    pub fn new(items: Vec<CriterionId>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        Self { items, index }
    }

    /// Returns the ordered items the builder assembles matrices over.
    pub fn items(&self) -> &[CriterionId] {
        &self.items
    }

    /// Assembles a reciprocal matrix from the given comparisons.
    ///
    /// # Algorithm
    ///
    /// 1. Validate each judgment value against the admissible range.
    /// 2. Resolve both endpoints to positions in the sibling set.
    /// 3. Drop redundant self-comparisons with value 1; reject any other
    ///    self-comparison.
    /// 4. Normalize orientation so the lower-positioned item is on the
    ///    left, taking the reciprocal when the record arrived flipped.
    /// 5. Reject contradictory re-judgments of a pair; tolerate exact
    ///    resubmissions. Write the value and its reciprocal.
    ///
    /// Pairs no comparison covers keep the neutral value 1; the returned
    /// matrix reports them through
    /// [`missing_pairs`](ComparisonMatrix::missing_pairs).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedComparison`] for out-of-range
    /// values, unknown endpoints, or non-neutral self-comparisons, and
    /// [`EngineError::DuplicateComparison`] when the same pair is judged
    /// twice with disagreeing values.
    pub fn build(&self, comparisons: &[Comparison]) -> Result<ComparisonMatrix, EngineError> {
        let mut matrix = ComparisonMatrix::neutral(self.items.clone());

        for comparison in comparisons {
            let judgment = Judgment::try_new(comparison.value)?;

            let left = self.position_of(comparison.left_id)?;
            let right = self.position_of(comparison.right_id)?;

            if left == right {
                if (judgment.value() - 1.0).abs() > CONFLICT_TOLERANCE {
                    return Err(EngineError::malformed_comparison(format!(
                        "item {} compared against itself with value {}",
                        comparison.left_id, comparison.value
                    )));
                }
                continue;
            }

            let (i, j, value) = if left < right {
                (left, right, judgment.value())
            } else {
                (right, left, judgment.reciprocal().value())
            };

            if matrix.is_judged(i, j) {
                let existing = matrix.get(i, j);
                if (existing - value).abs() > CONFLICT_TOLERANCE {
                    return Err(EngineError::duplicate_comparison(
                        self.items[i],
                        self.items[j],
                        existing,
                        value,
                    ));
                }
                continue;
            }

            matrix.set_pair(i, j, value);
        }

        Ok(matrix)
    }

    fn position_of(&self, id: CriterionId) -> Result<usize, EngineError> {
        self.index.get(&id).copied().ok_or_else(|| {
            EngineError::malformed_comparison(format!(
                "comparison references {} which is not among the compared siblings",
                id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EvaluatorId;

    fn evaluator() -> EvaluatorId {
        EvaluatorId::new("e1").unwrap()
    }

    fn compare(left: CriterionId, right: CriterionId, value: f64) -> Comparison {
        Comparison::new(evaluator(), left, right, value)
    }

    #[test]
    fn builds_complete_matrix_from_one_orientation() {
        let ids: Vec<CriterionId> = (0..3).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let matrix = builder
            .build(&[
                compare(ids[0], ids[1], 2.0),
                compare(ids[0], ids[2], 4.0),
                compare(ids[1], ids[2], 2.0),
            ])
            .unwrap();

        assert!(matrix.is_complete());
        assert_eq!(matrix.get(0, 1), 2.0);
        assert!((matrix.get(1, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn normalizes_flipped_orientation_to_reciprocal() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        // Judged as "second over first", stored as its reciprocal.
        let matrix = builder.build(&[compare(ids[1], ids[0], 5.0)]).unwrap();

        assert!((matrix.get(0, 1) - 0.2).abs() < 1e-12);
        assert!((matrix.get(1, 0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_value_outside_admissible_range() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let err = builder
            .build(&[compare(ids[0], ids[1], 12.0)])
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedComparison { .. }));
    }

    #[test]
    fn rejects_zero_and_non_finite_values() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err = builder.build(&[compare(ids[0], ids[1], bad)]).unwrap_err();
            assert!(matches!(err, EngineError::MalformedComparison { .. }));
        }
    }

    #[test]
    fn rejects_unknown_endpoint() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let stranger = CriterionId::new();
        let err = builder.build(&[compare(ids[0], stranger, 3.0)]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedComparison { .. }));
    }

    #[test]
    fn ignores_neutral_self_comparison() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let matrix = builder.build(&[compare(ids[0], ids[0], 1.0)]).unwrap();
        assert_eq!(matrix.get(0, 0), 1.0);
        assert!(!matrix.is_judged(0, 1));
    }

    #[test]
    fn rejects_non_neutral_self_comparison() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let err = builder.build(&[compare(ids[0], ids[0], 3.0)]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedComparison { .. }));
    }

    #[test]
    fn rejects_contradictory_duplicate() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let err = builder
            .build(&[compare(ids[0], ids[1], 3.0), compare(ids[0], ids[1], 5.0)])
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateComparison { .. }));
    }

    #[test]
    fn rejects_contradiction_across_orientations() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        // 3.0 one way and 3.0 the other way contradict (the second
        // normalizes to 1/3).
        let err = builder
            .build(&[compare(ids[0], ids[1], 3.0), compare(ids[1], ids[0], 3.0)])
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateComparison { .. }));
    }

    #[test]
    fn tolerates_identical_resubmission() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let matrix = builder
            .build(&[compare(ids[0], ids[1], 3.0), compare(ids[0], ids[1], 3.0)])
            .unwrap();
        assert_eq!(matrix.get(0, 1), 3.0);
    }

    #[test]
    fn tolerates_resubmission_in_flipped_orientation() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let matrix = builder
            .build(&[
                compare(ids[0], ids[1], 2.0),
                compare(ids[1], ids[0], 0.5),
            ])
            .unwrap();
        assert_eq!(matrix.get(0, 1), 2.0);
    }

    #[test]
    fn leaves_unjudged_pairs_neutral() {
        let ids: Vec<CriterionId> = (0..3).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        let matrix = builder.build(&[compare(ids[0], ids[1], 3.0)]).unwrap();

        assert!(!matrix.is_complete());
        assert_eq!(matrix.get(0, 2), 1.0);
        assert_eq!(
            matrix.missing_pairs(),
            vec![(ids[0], ids[2]), (ids[1], ids[2])]
        );
    }

    #[test]
    fn boundary_values_are_accepted() {
        let ids: Vec<CriterionId> = (0..2).map(|_| CriterionId::new()).collect();
        let builder = MatrixBuilder::new(ids.clone());
        for value in [1.0 / 9.0, 9.0] {
            assert!(builder.build(&[compare(ids[0], ids[1], value)]).is_ok());
        }
    }
}
