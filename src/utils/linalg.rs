//! Dense solvers for the damped normal equations and for covariance
//! estimation, backed by faer's factorizations.
//!
//! The systems here are `n x n` with `n` the number of fit parameters, a few
//! dozen at most.

use faer::linalg::solvers::{DenseSolveCore, Llt, Solve, SolveLstsq};
use faer::Side;
use ndarray::{Array1, Array2};

use super::matrix_convert::{faer_to_ndarray, faer_vec_to_ndarray, ndarray_to_faer, ndarray_vec_to_faer};

/// Relative size below which a squared Cholesky pivot counts as zero.
const PIVOT_EPSILON: f64 = 1e-14;

/// Cholesky factorization `A = L L^T` of a symmetric positive definite matrix.
///
/// Returns `None` if `A` is not numerically positive definite: faer rejects
/// non-positive pivots, and pivots that vanish relative to the matching
/// diagonal entry of `A` are rejected here as singular up to rounding.
pub fn cholesky(a: &Array2<f64>) -> Option<Llt<f64>> {
    let llt = ndarray_to_faer(a).llt(Side::Lower).ok()?;

    let l = llt.L();
    for k in 0..a.nrows() {
        let pivot = l[(k, k)] * l[(k, k)];
        if !(pivot > PIVOT_EPSILON * a[[k, k]].abs()) || !pivot.is_finite() {
            return None;
        }
    }

    Some(llt)
}

/// Solve `L L^T x = b` given the Cholesky factorization.
pub fn cholesky_solve(llt: &Llt<f64>, b: &Array1<f64>) -> Array1<f64> {
    faer_vec_to_ndarray(&llt.solve(&ndarray_vec_to_faer(b)))
}

/// Invert a symmetric positive definite matrix through its Cholesky factor.
pub fn spd_inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let llt = cholesky(a)?;
    Some(faer_to_ndarray(&llt.inverse()))
}

/// Least-squares solution of `A x ≈ b` by Householder QR.
///
/// `A` must have at least as many rows as columns and full column rank; the
/// result is not finite otherwise.
pub fn solve_qr(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let qr = ndarray_to_faer(a).qr();
    faer_vec_to_ndarray(&qr.solve_lstsq(&ndarray_vec_to_faer(b)))
}
