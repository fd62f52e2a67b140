//! Domain layer containing the AHP computation services and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `judgment` - Pairwise comparisons and reciprocal matrix construction
//! - `priority` - Priority vector derivation and consistency measurement
//! - `hierarchy` - Criteria tree and global weight composition
//! - `consensus` - Group aggregation and agreement diagnostics
//! - `sensitivity` - Weight perturbation and rank-robustness analysis
//!
//! All services in this layer are pure and stateless: they take domain
//! objects as input and return computed results. No ports or adapters are
//! needed since there is no I/O and no external dependency.

pub mod consensus;
pub mod foundation;
pub mod hierarchy;
pub mod judgment;
pub mod priority;
pub mod sensitivity;
