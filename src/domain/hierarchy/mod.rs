//! Criteria hierarchy: tree structure and weight composition.
//!
//! # Components
//!
//! - [`Criterion`] / [`NodeKind`]: caller-submitted node records
//! - [`CriterionTree`]: validated arena-backed tree plus the flat
//!   alternative set
//! - [`HierarchyComposer`]: local sibling weights into global
//!   priorities and alternative scores

mod composer;
mod criterion;
mod tree;

pub use composer::{GlobalWeights, HierarchyComposer, LocalPriorities};
pub use criterion::{Criterion, NodeKind};
pub use tree::CriterionTree;
