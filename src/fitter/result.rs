//! The outcome of a successful fit.

use crate::lm::ConvergenceStatus;
use crate::model::PeakModel;
use crate::uncertainty::{calculate_correlation, standard_errors_from_covariance};
use ndarray::{Array1, Array2};

use super::report::{round_to, FitReport};

/// Fitted model and its statistics.
///
/// Only produced when the solver reports convergence.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// The fitted peaks and baseline
    pub model: PeakModel,

    /// The fitted parameter vector, same layout as the seed
    pub params: Array1<f64>,

    /// Estimated covariance of `params`, all `+inf` when it could not be estimated
    pub covariance: Array2<f64>,

    /// Sum of squared residuals at the solution
    pub cost: f64,

    /// Number of samples fitted
    pub n_points: usize,

    pub iterations: usize,
    pub func_evals: usize,
    pub status: ConvergenceStatus,
    pub message: String,
}

impl FitResult {
    /// Degrees of freedom, samples minus parameters.
    pub fn dof(&self) -> usize {
        self.n_points.saturating_sub(self.params.len())
    }

    /// `cost / dof`, or `None` with no degrees of freedom.
    pub fn reduced_chi_square(&self) -> Option<f64> {
        match self.dof() {
            0 => None,
            dof => Some(self.cost / dof as f64),
        }
    }

    /// One-sigma errors, the square roots of the covariance diagonal.
    pub fn standard_errors(&self) -> Array1<f64> {
        standard_errors_from_covariance(&self.covariance)
    }

    pub fn correlation(&self) -> Array2<f64> {
        calculate_correlation(&self.covariance)
    }

    /// The fitted vector rounded for display in a parameter editor.
    pub fn rounded_params(&self, decimals: u32) -> Vec<f64> {
        self.params.iter().map(|v| round_to(*v, decimals)).collect()
    }

    /// Summarize this result.
    pub fn report(&self) -> FitReport {
        FitReport::from_result(self)
    }
}
