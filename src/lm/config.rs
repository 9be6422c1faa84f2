//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the configuration options and parameter settings for the
//! Levenberg-Marquardt algorithm: convergence tolerances, damping schedule,
//! evaluation budget, and the linear solver used for each step.

/// Method for solving the damped normal equations in each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMethod {
    /// Use Cholesky decomposition (fastest but requires positive definite matrix)
    Cholesky,

    /// Use QR decomposition of the augmented Jacobian (more stable than Cholesky)
    QR,

    /// Try Cholesky first, fall back to QR if it fails
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of accepted iterations. Default: 100
    pub max_iterations: usize,

    /// Maximum number of residual evaluations, including the ones spent on
    /// finite-difference Jacobians. Default: `None`, meaning `200 * (n + 1)`
    /// for `n` parameters.
    pub max_func_evals: Option<usize>,

    /// Tolerance for relative change in the cost. Default: 1e-8
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-8
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 1e-8
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-10
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,

    /// Whether to calculate and return the Jacobian at the solution. Default: false
    pub calc_jacobian: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_func_evals: None,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            decomposition_method: DecompositionMethod::default(),
            calc_jacobian: false,
        }
    }
}

impl LmConfig {
    /// Function evaluation budget for a problem with `n_params` parameters.
    pub fn func_eval_budget(&self, n_params: usize) -> usize {
        self.max_func_evals.unwrap_or(200 * (n_params + 1))
    }
}
