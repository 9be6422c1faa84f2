//! # peakfit-rs
//!
//! `peakfit-rs` fits a superposition of spectral peaks on a linear baseline
//! to (x, y) data with the Levenberg-Marquardt algorithm.
//!
//! The library provides:
//! - Lorentzian, Gaussian and Voigt peak shapes (the latter via the Faddeeva function)
//! - A typed peak model that flattens to a parameter vector only for the solver
//! - A Levenberg-Marquardt solver with covariance estimation
//! - A [`Fitter`] state machine producing per-peak decompositions and reports
//!
//! ## Basic Usage
//!
//! ```
//! use peakfit_rs::Fitter;
//!
//! let x: Vec<f64> = (0..=10).map(f64::from).collect();
//! let y: Vec<f64> = x.iter().map(|v| 10.0 * (-0.5 * (v - 5.0).powi(2)).exp()).collect();
//!
//! let mut fitter = Fitter::new();
//! fitter.set_shape("Gaussian").unwrap();
//! fitter.set_data(&x, &y, (0.0, 10.0)).unwrap();
//! fitter.set_params(&[4.8, 9.0, 1.2, 0.0, 0.0]).unwrap();
//!
//! let result = fitter.fit().unwrap();
//! assert!((result.params[0] - 5.0).abs() < 1e-4);
//!
//! let decomposition = fitter.decompose().unwrap();
//! assert_eq!(decomposition.len(), 3);
//! ```

pub mod error;
pub mod fitter;
pub mod lm;
pub mod model;
pub mod problem;
pub mod shapes;
pub mod uncertainty;

mod utils;

// Re-exports for convenience
pub use error::{FitError, FitFailure, Result};
pub use fitter::{Decomposition, FitReport, FitResult, Fitter, FitterState};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use model::{Baseline, Peak, PeakModel, ShapeKind};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
