//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization.

use log::debug;
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{FitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;
use crate::utils::linalg::{cholesky, cholesky_solve, solve_qr};
use crate::utils::{faer_vec_to_ndarray, ndarray_to_faer, ndarray_vec_to_faer};

use super::config::{DecompositionMethod, LmConfig};
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the maximum number of function evaluations.
    pub fn with_max_func_evals(mut self, max_func_evals: usize) -> Self {
        self.config.max_func_evals = Some(max_func_evals);
        self
    }

    /// Set the tolerance for change in residual norm.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the method used for solving the linear system.
    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.config.decomposition_method = method;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Running out of iterations or evaluations, or failing to find a
    /// cost-reducing step, yields `Ok` with `success == false`. An `Err` means
    /// the problem itself could not be evaluated.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The result of the optimization
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = ConvergenceCriteria::from(&self.config);
        let max_func_evals = self.config.func_eval_budget(n_params);

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        if !cost.is_finite() {
            return Err(FitError::FunctionEvaluation(
                "Residuals are not finite at the initial parameters".to_string(),
            ));
        }

        let status = 'outer: loop {
            let jacobian_evals = finite_difference::evaluations(n_params);
            if func_evals + jacobian_evals > max_func_evals {
                break ConvergenceStatus::MaxFunctionEvaluationsReached;
            }

            let jacobian = problem.jacobian(&params)?;
            func_evals += jacobian_evals;

            // Gradient g = J^T * r
            let j = ndarray_to_faer(&jacobian);
            let r = ndarray_vec_to_faer(&residuals);
            let g = j.as_ref().transpose() * r.as_ref();
            let gradient_norm = g.norm_l2();

            if !gradient_norm.is_finite() {
                break ConvergenceStatus::NumericalError;
            }
            if criteria.gradient_converged(gradient_norm) {
                break ConvergenceStatus::GradientConvergence;
            }

            let jtr = faer_vec_to_ndarray(&g);

            // Increase damping until a step lowers the cost
            loop {
                if func_evals >= max_func_evals {
                    break 'outer ConvergenceStatus::MaxFunctionEvaluationsReached;
                }

                let step = match self.calculate_step(&jacobian, &residuals, &jtr, lambda) {
                    Some(step) => step,
                    None => {
                        lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                        if lambda >= self.config.max_lambda {
                            break 'outer ConvergenceStatus::NumericalError;
                        }
                        continue;
                    }
                };

                let new_params = &params + &step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_of_squares(&new_residuals);

                if new_cost < cost {
                    iterations += 1;
                    let status = criteria.check(&params, &new_params, cost, new_cost, iterations);

                    debug!(
                        "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.1e}",
                        iterations, cost, new_cost, lambda
                    );

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                    if status.is_terminated() {
                        break 'outer status;
                    }
                    break;
                }

                let status = criteria.check_rejected(&params, &new_params, cost, new_cost);
                if status.is_terminated() {
                    break 'outer status;
                }

                // Step rejected - increase lambda and try again
                lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                if lambda >= self.config.max_lambda {
                    break 'outer ConvergenceStatus::NumericalError;
                }
            }
        };

        let success = status.is_converged();
        let message = match status {
            ConvergenceStatus::NumericalError => {
                "Failed to decrease cost, and lambda reached maximum".to_string()
            }
            ConvergenceStatus::MaxIterationsReached => {
                format!("Maximum iterations ({}) reached", self.config.max_iterations)
            }
            ConvergenceStatus::MaxFunctionEvaluationsReached => {
                format!("Maximum function evaluations ({}) reached", max_func_evals)
            }
            other => other.description().to_string(),
        };

        debug!(
            "finished after {} iterations, {} evaluations: {}",
            iterations, func_evals, message
        );

        let jacobian = if self.config.calc_jacobian {
            Some(problem.jacobian(&params)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            success,
            message,
            jacobian,
        })
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// This method solves the equation (J^T J + λ D) δ = -J^T r, where:
    /// - J is the Jacobian matrix
    /// - r is the residual vector
    /// - λ is the damping parameter
    /// - D is the diagonal of J^T J, floored at 1e-10
    /// - δ is the step
    ///
    /// Returns `None` if no finite step could be computed.
    fn calculate_step(
        &self,
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        jtr: &Array1<f64>,
        lambda: f64,
    ) -> Option<Array1<f64>> {
        let n = jacobian.ncols();
        let mut a = jacobian.t().dot(jacobian);
        let damping: Array1<f64> = a.diag().mapv(|d| lambda * d.max(1e-10));

        for i in 0..n {
            a[[i, i]] += damping[i];
        }

        let solution = match self.config.decomposition_method {
            DecompositionMethod::QR => Self::solve_augmented_qr(jacobian, residuals, &damping),
            DecompositionMethod::Cholesky | DecompositionMethod::Auto => match cholesky(&a) {
                Some(llt) => cholesky_solve(&llt, jtr),
                None if self.config.decomposition_method == DecompositionMethod::Auto => {
                    Self::solve_augmented_qr(jacobian, residuals, &damping)
                }
                None => return None,
            },
        };

        if solution.iter().all(|v| v.is_finite()) {
            Some(-solution)
        } else {
            None
        }
    }

    /// Solve the damped system as the least-squares problem
    /// `[J; sqrt(λD)] δ ≈ [r; 0]`, which avoids forming J^T J.
    fn solve_augmented_qr(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        damping: &Array1<f64>,
    ) -> Array1<f64> {
        let (m, n) = jacobian.dim();
        let mut augmented = Array2::zeros((m + n, n));
        augmented.slice_mut(ndarray::s![..m, ..]).assign(jacobian);
        for i in 0..n {
            augmented[[m + i, i]] = damping[i].sqrt();
        }

        let mut rhs = Array1::zeros(m + n);
        rhs.slice_mut(ndarray::s![..m]).assign(residuals);

        solve_qr(&augmented, &rhs)
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r.powi(2)).sum()
}
