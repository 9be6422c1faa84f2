//! # Uncertainty Calculation
//!
//! Covariance, correlation, and standard errors of fitted parameters, estimated
//! from the Jacobian at the solution.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, covariance_or_infinite,
    standard_errors_from_covariance,
};
