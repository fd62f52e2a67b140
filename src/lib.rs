//! AHP Engine - Priority & Consensus Computation for Decision Studies
//!
//! This crate implements the computational core of an Analytic Hierarchy
//! Process platform: it turns raw pairwise-comparison judgments into
//! validated priority vectors, composes them across a multi-level
//! criteria hierarchy, aggregates evaluators into a group result with
//! consensus diagnostics, and runs sensitivity analysis on the outcome.
//!
//! The engine is a pure library: it performs no I/O, holds no state
//! between calls, and exposes no network surface. Request parsing,
//! authentication, and persistence belong to the caller.

pub mod domain;
pub mod engine;
