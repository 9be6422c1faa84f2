//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use crate::error::{FitError, Result};
use crate::utils::linalg::spd_inverse;
use log::warn;
use ndarray::{Array1, Array2};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// Fails with `SingularMatrix` when `J^T J` is not positive definite.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let inverse = spd_inverse(&jtj).ok_or(FitError::SingularMatrix)?;
    Ok(inverse * redchi)
}

/// Covariance of a fit with `chisqr` at the minimum, or a matrix of `+inf`
/// when it cannot be estimated.
///
/// The estimate is unavailable when there are no degrees of freedom left
/// (as many points as parameters) or when `J^T J` is singular.
pub fn covariance_or_infinite(jacobian: &Array2<f64>, chisqr: f64) -> Array2<f64> {
    let (ndata, nvarys) = jacobian.dim();
    let infinite = || Array2::from_elem((nvarys, nvarys), f64::INFINITY);

    if ndata <= nvarys {
        warn!(
            "covariance of the parameters could not be estimated: {} points for {} parameters",
            ndata, nvarys
        );
        return infinite();
    }

    let redchi = chisqr / (ndata - nvarys) as f64;
    match calculate_covariance(jacobian, redchi) {
        Ok(covar) => covar,
        Err(err) => {
            warn!("covariance of the parameters could not be estimated: {}", err);
            infinite()
        }
    }
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// This normalizes the covariance matrix so that diagonal elements are 1.0,
/// and off-diagonal elements represent correlation coefficients between -1 and 1.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                correl[[i, j]] = if denom > 0.0 && denom.is_finite() {
                    covar[[i, j]] / denom
                } else {
                    0.0
                };
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
