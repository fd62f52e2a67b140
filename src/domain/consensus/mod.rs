//! Group aggregation and agreement diagnostics.
//!
//! # Components
//!
//! - [`GroupAggregator`]: weighted geometric-mean aggregation of
//!   evaluator weight vectors
//! - [`ConsensusResult`] / [`ConsensusDiagnostics`]: group weights with
//!   Kendall's W, Spearman correlations, outliers, and contested items
//! - [`rank_statistics`]: the underlying rank-agreement formulas

mod aggregator;
pub mod rank_statistics;

pub use aggregator::{ConsensusDiagnostics, ConsensusResult, GroupAggregator};
