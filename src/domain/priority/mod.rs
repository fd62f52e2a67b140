//! Priority derivation from reciprocal comparison matrices.
//!
//! # Components
//!
//! - [`PrioritySolver`]: principal-eigenvector weights with a
//!   geometric-mean fallback
//! - [`PriorityVector`]: normalized weights, ranks, and consistency
//!   diagnostics for one matrix
//! - [`rank_items`]: final-ranking construction with the deterministic
//!   tie-break
//! - [`consistency`]: Random Index table and CI/CR arithmetic

pub mod consistency;
mod ranking;
mod solver;
mod vector;

pub use ranking::{rank_items, RankedItem};
pub use solver::{PrioritySolver, DEFAULT_CONSISTENCY_THRESHOLD};
pub use vector::{rank_permutation, DerivationMethod, PriorityVector};
