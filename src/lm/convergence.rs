//! Convergence criteria for the Levenberg-Marquardt solver.
//!
//! This module defines the criteria used to determine when the solver has
//! converged to a solution, or has to give up.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::config::LmConfig;

/// Possible convergence states for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The algorithm has terminated due to exhausting its function evaluation budget.
    MaxFunctionEvaluationsReached,

    /// The algorithm has terminated due to a numerical error.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small function value change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::MaxFunctionEvaluationsReached => {
                "Terminated: maximum function evaluations reached"
            }
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

/// Criteria for determining when the solver has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for relative change in parameter values.
    pub xtol: f64,

    /// Tolerance for relative change in the cost.
    pub ftol: f64,

    /// Tolerance for gradient norm.
    pub gtol: f64,

    /// Maximum number of accepted iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self::from(&LmConfig::default())
    }
}

impl From<&LmConfig> for ConvergenceCriteria {
    fn from(config: &LmConfig) -> Self {
        Self {
            xtol: config.xtol,
            ftol: config.ftol,
            gtol: config.gtol,
            max_iterations: config.max_iterations,
        }
    }
}

impl ConvergenceCriteria {
    /// Checks the state after an accepted step.
    ///
    /// A converging step wins over the iteration limit, so the final
    /// iteration is still allowed to succeed.
    pub fn check(
        &self,
        params: &Array1<f64>,
        new_params: &Array1<f64>,
        cost: f64,
        new_cost: f64,
        iterations: usize,
    ) -> ConvergenceStatus {
        if relative_change(params, new_params) < self.xtol {
            return ConvergenceStatus::ParameterConvergence;
        }

        if cost_change(cost, new_cost) < self.ftol {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        if iterations >= self.max_iterations {
            return ConvergenceStatus::MaxIterationsReached;
        }

        ConvergenceStatus::Running
    }

    /// Checks the state after a rejected step.
    ///
    /// Close to the optimum the damped step can no longer lower the cost
    /// because of rounding. When the rejected step is already negligible,
    /// the current parameters are reported as converged.
    pub fn check_rejected(
        &self,
        params: &Array1<f64>,
        trial_params: &Array1<f64>,
        cost: f64,
        trial_cost: f64,
    ) -> ConvergenceStatus {
        if relative_change(params, trial_params) < self.xtol {
            ConvergenceStatus::ParameterConvergence
        } else if trial_cost.is_finite() && cost_change(cost, trial_cost) < self.ftol {
            ConvergenceStatus::FunctionValueConvergence
        } else {
            ConvergenceStatus::Running
        }
    }

    /// Checks the gradient norm at the current parameters.
    pub fn gradient_converged(&self, gradient_norm: f64) -> bool {
        gradient_norm < self.gtol
    }
}

/// Largest parameter change, relative to the parameter magnitude (at least 1).
fn relative_change(params: &Array1<f64>, new_params: &Array1<f64>) -> f64 {
    new_params
        .iter()
        .zip(params.iter())
        .map(|(a, b)| (a - b).abs() / b.abs().max(1.0))
        .fold(0.0, f64::max)
}

fn cost_change(cost: f64, new_cost: f64) -> f64 {
    (cost - new_cost).abs() / cost.max(1e-10)
}
