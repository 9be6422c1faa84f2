//! Finite difference methods for numerical differentiation.
//!
//! Peak shapes are evaluated through a runtime-sized parameter vector, so the
//! solver differentiates them numerically rather than per-shape.

use crate::error::{FitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Relative step for central differences, roughly the cube root of machine
/// epsilon.
const DEFAULT_EPSILON: f64 = 6e-6;

/// Residual evaluations one call to [`jacobian`] spends for `n_params`
/// parameters.
pub const fn evaluations(n_params: usize) -> usize {
    2 * n_params
}

/// Compute the Jacobian matrix J[i,j] = ∂residual[i]/∂param[j] by central
/// differences.
///
/// Each column costs two residual evaluations at `p ± h` with
/// `h = epsilon · max(|p|, 1)`. The truncation error is O(h²), which keeps the
/// center derivative of a peak accurate when the center sits on a sample.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_residuals = problem.residual_count();
    let mut jac = Array2::zeros((n_residuals, params.len()));

    let mut shifted = params.clone();
    for (j, &p) in params.iter().enumerate() {
        let h = eps * p.abs().max(1.0);

        shifted[j] = p + h;
        let ahead = checked_eval(problem, &shifted, n_residuals)?;
        shifted[j] = p - h;
        let behind = checked_eval(problem, &shifted, n_residuals)?;
        shifted[j] = p;

        // Divide by the step actually taken after rounding
        let span = (p + h) - (p - h);
        jac.column_mut(j).assign(&((ahead - behind) / span));
    }

    Ok(jac)
}

fn checked_eval(problem: &dyn Problem, params: &Array1<f64>, expected: usize) -> Result<Array1<f64>> {
    let residuals = problem.eval(params)?;
    if residuals.len() != expected {
        return Err(FitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            expected,
            residuals.len()
        )));
    }
    Ok(residuals)
}
