//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares solver that drives peak
//! fitting: a damped Gauss-Newton iteration with configurable tolerances and
//! an evaluation budget.

pub mod algorithm;
pub mod config;
pub mod convergence;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
