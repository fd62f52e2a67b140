//! Engine layer: the end-to-end evaluation entrypoint and its typed
//! request and result records.
//!
//! # Components
//!
//! - [`Engine`]: orchestrates tree validation, matrix assembly,
//!   priority derivation, composition, group aggregation, and the
//!   optional sensitivity sweep
//! - [`EvaluationRequest`]: everything one computation call consumes
//! - [`EvaluationOutcome`]: everything one computation call returns
//!
//! This is the only layer that logs. The domain services underneath
//! are pure and silent; callers wanting a single concern (solving one
//! matrix, composing one tree) use those services directly.

mod evaluate;
mod outcome;
mod request;

pub use evaluate::Engine;
pub use outcome::{EvaluationOutcome, EvaluatorResult, GroupResult, MatrixKind, MatrixSummary};
pub use request::EvaluationRequest;
