//! What-if perturbation of criterion weights.
//!
//! # Components
//!
//! - [`SensitivityRequest`]: caller parameters for one sweep
//! - [`SensitivityAnalyzer`]: the sweep itself, with rank-reversal
//!   detection and the top-score slope
//! - [`SensitivityRun`] / [`SensitivityStep`]: per-sample rankings and
//!   summary figures

mod analyzer;
mod request;

pub use analyzer::{SensitivityAnalyzer, SensitivityRun, SensitivityStep};
pub use request::{SensitivityRequest, DEFAULT_RANGE, DEFAULT_STEPS};
