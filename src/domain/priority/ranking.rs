//! Final ranking construction with the deterministic tie-break.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::foundation::CriterionId;

/// One entry of a final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item_id: CriterionId,
    pub score: f64,
    pub rank: usize,
}

/// Ranks scored items by descending score, 1-based.
///
/// Equal scores are ordered by ascending item id, so identical inputs
/// always produce the identical ranking. The result is sorted by rank.
pub fn rank_items(scored: &[(CriterionId, f64)]) -> Vec<RankedItem> {
    let mut ordered = scored.to_vec();
    ordered.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ordered
        .into_iter()
        .enumerate()
        .map(|(position, (item_id, score))| RankedItem {
            item_id,
            score,
            rank: position + 1,
        })
        .collect()
}
