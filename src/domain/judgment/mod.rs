//! Judgment module - Pairwise comparisons and reciprocal matrix construction.
//!
//! # Components
//!
//! - `Comparison` - Immutable judgment record as received from the caller
//! - `ComparisonMatrix` - Reciprocal n×n matrix over an ordered sibling set
//! - `MatrixBuilder` - Validated assembly of a matrix from judgment records

mod builder;
mod comparison;
mod matrix;

pub use builder::MatrixBuilder;
pub use comparison::Comparison;
pub use matrix::ComparisonMatrix;
