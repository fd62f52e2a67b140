//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the AHP engine domain.

mod errors;
mod ids;
mod judgment_value;

pub use errors::EngineError;
pub use ids::{CriterionId, EvaluatorId};
pub use judgment_value::Judgment;
