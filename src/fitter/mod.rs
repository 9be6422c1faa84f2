//! The long-lived fitter that ties data, shape, seed and result together.
//!
//! A [`Fitter`] is configured step by step (shape, parameter seed, data range),
//! then fitted. Each `set_*` call replaces the matching piece of state and
//! discards any fitted result that depended on it. A failed `fit()` leaves a
//! previous successful result in place.

mod data;
mod decomposition;
mod report;
mod result;

pub use data::SpectrumSlice;
pub use decomposition::{Decomposition, RenderStyle, Series, SeriesRole};
pub use report::{FitReport, ParamEstimate, PeakEstimate, DISPLAY_DECIMALS};
pub use result::FitResult;

use crate::error::{FitError, FitFailure, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::model::{Baseline, Peak, PeakModel, ShapeKind, SuperpositionProblem};
use crate::problem::Problem;
use crate::uncertainty::covariance_or_infinite;
use log::{debug, info, warn};

/// Where a [`Fitter`] is in its configure-then-fit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitterState {
    /// No data has been set.
    Unconfigured,
    /// Data and shape are set, no parameter seed.
    Configured,
    /// A parameter seed is set but not fitted.
    Parameterized,
    /// The last fit succeeded and nothing has changed since.
    Fitted,
}

/// Multi-peak fitter over a single spectrum slice.
#[derive(Debug, Clone, Default)]
pub struct Fitter {
    shape: ShapeKind,
    data: Option<SpectrumSlice>,
    seed: Option<PeakModel>,
    result: Option<FitResult>,
    solver: LevenbergMarquardt,
}

impl Fitter {
    /// A fitter with Lorentzian shape and the default solver configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self {
            solver: LevenbergMarquardt::with_config(config),
            ..Self::default()
        }
    }

    /// Replace the solver configuration. Data, seed and result are kept.
    pub fn set_config(&mut self, config: LmConfig) {
        self.solver = LevenbergMarquardt::with_config(config);
    }

    pub fn config(&self) -> &LmConfig {
        self.solver.config()
    }

    pub fn state(&self) -> FitterState {
        if self.data.is_none() {
            FitterState::Unconfigured
        } else if self.result.is_some() {
            FitterState::Fitted
        } else if self.seed.is_some() {
            FitterState::Parameterized
        } else {
            FitterState::Configured
        }
    }

    /// Restrict the samples to `x_min <= x <= x_max` and store them.
    ///
    /// A range containing no samples is accepted; fitting then fails with
    /// [`FitFailure::NoData`].
    pub fn set_data(&mut self, x: &[f64], y: &[f64], range: (f64, f64)) -> Result<()> {
        let slice = SpectrumSlice::new(x, y, range)?;
        debug!(
            "data set: {} of {} samples in [{}, {}]",
            slice.len(),
            x.len(),
            range.0,
            range.1
        );
        if slice.is_empty() {
            warn!("no samples in [{}, {}]", range.0, range.1);
        }

        self.data = Some(slice);
        self.result = None;
        Ok(())
    }

    /// Select the peak shape by its exact name.
    pub fn set_shape(&mut self, name: &str) -> Result<()> {
        let shape = name.parse()?;
        self.set_shape_kind(shape);
        Ok(())
    }

    /// Select the peak shape. Switching to a different shape discards the seed
    /// and any fitted result.
    pub fn set_shape_kind(&mut self, shape: ShapeKind) {
        if shape != self.shape {
            debug!("shape changed from {} to {}", self.shape, shape);
            self.seed = None;
            self.result = None;
        }
        self.shape = shape;
    }

    /// Set the initial parameter vector.
    ///
    /// The length must be `N * arity + 2` for the current shape. Returns the
    /// inferred number of peaks N.
    pub fn set_params(&mut self, params: &[f64]) -> Result<usize> {
        let seed = PeakModel::from_vector(self.shape, params)?;
        let n_peaks = seed.peak_count();
        debug!("seed set: {} {} peak(s)", n_peaks, self.shape);

        self.seed = Some(seed);
        self.result = None;
        Ok(n_peaks)
    }

    /// Append a peak to the seed, starting from a zero baseline if no seed
    /// exists yet.
    pub fn push_peak(&mut self, peak: Peak) -> Result<usize> {
        if peak.shape() != self.shape {
            return Err(FitError::DimensionMismatch(format!(
                "cannot add a {} peak to a {} fit",
                peak.shape(),
                self.shape
            )));
        }

        let (mut peaks, baseline) = match &self.seed {
            Some(seed) => (seed.peaks().to_vec(), seed.baseline()),
            None => (Vec::new(), Baseline::default()),
        };
        peaks.push(peak);

        let seed = PeakModel::new(self.shape, peaks, baseline)?;
        let n_peaks = seed.peak_count();
        self.seed = Some(seed);
        self.result = None;
        Ok(n_peaks)
    }

    /// Drop the peak at `index` from the seed and discard any fitted result.
    ///
    /// Returns the number of peaks left in the seed.
    pub fn remove_peak(&mut self, index: usize) -> Result<usize> {
        let seed = match &self.seed {
            Some(seed) if index < seed.peak_count() => seed,
            _ => {
                return Err(FitError::DimensionMismatch(format!(
                    "no peak at index {} (seed has {})",
                    index,
                    self.peak_count()
                )))
            }
        };

        let mut peaks = seed.peaks().to_vec();
        peaks.remove(index);
        let seed = PeakModel::new(self.shape, peaks, seed.baseline())?;
        let n_peaks = seed.peak_count();
        debug!("removed peak {}: {} peak(s) left", index, n_peaks);

        self.seed = Some(seed);
        self.result = None;
        Ok(n_peaks)
    }

    /// Seed a new peak from a rectangle selected over the spectrum.
    ///
    /// A degenerate rectangle leaves the seed unchanged and returns `Ok(None)`.
    pub fn push_selection(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Option<usize>> {
        match Peak::from_selection(self.shape, x0, y0, x1, y1) {
            Some(peak) => self.push_peak(peak).map(Some),
            None => Ok(None),
        }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn data(&self) -> Option<&SpectrumSlice> {
        self.data.as_ref()
    }

    pub fn seed(&self) -> Option<&PeakModel> {
        self.seed.as_ref()
    }

    /// The last successful fit, unless state has changed since.
    pub fn result(&self) -> Option<&FitResult> {
        self.result.as_ref()
    }

    /// Number of peaks in the seed, 0 if none is set.
    pub fn peak_count(&self) -> usize {
        self.seed.as_ref().map_or(0, PeakModel::peak_count)
    }

    /// Run Levenberg-Marquardt from the seed against the stored data.
    ///
    /// On success the result is stored and returned. On failure any earlier
    /// result is kept.
    pub fn fit(&mut self) -> std::result::Result<&FitResult, FitFailure> {
        match self.run_fit() {
            Ok(result) => {
                info!(
                    "fit converged after {} iterations: cost {:.6e}",
                    result.iterations, result.cost
                );
                let stored: &FitResult = self.result.insert(result);
                Ok(stored)
            }
            Err(failure) => {
                warn!("fit failed: {}", failure);
                Err(failure)
            }
        }
    }

    fn run_fit(&self) -> std::result::Result<FitResult, FitFailure> {
        let seed = self.seed.as_ref().ok_or(FitFailure::NoParameters)?;
        let data = match &self.data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(FitFailure::NoData),
        };

        let n_params = seed.parameter_count();
        if data.len() < n_params {
            return Err(FitFailure::TooFewPoints {
                points: data.len(),
                params: n_params,
            });
        }

        let problem = SuperpositionProblem::new(
            self.shape,
            seed.peak_count(),
            data.x().clone(),
            data.y().clone(),
        )?;
        let outcome = self.solver.minimize(&problem, seed.to_vector())?;
        if !outcome.success {
            return Err(FitFailure::NotConverged(outcome.message));
        }

        let jacobian = match outcome.jacobian {
            Some(jacobian) => jacobian,
            None => problem.jacobian(&outcome.params)?,
        };
        let covariance = covariance_or_infinite(&jacobian, outcome.cost);

        Ok(FitResult {
            model: problem.model(&outcome.params)?,
            params: outcome.params,
            covariance,
            cost: outcome.cost,
            n_points: data.len(),
            iterations: outcome.iterations,
            func_evals: outcome.func_evals,
            status: outcome.status,
            message: outcome.message,
        })
    }

    /// Evaluate the fitted model and each of its parts over the data slice.
    pub fn decompose(&self) -> std::result::Result<Decomposition, FitFailure> {
        let data = match &self.data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(FitFailure::NoData),
        };
        let result = self.result.as_ref().ok_or(FitFailure::NotFitted)?;
        Ok(Decomposition::new(&result.model, data.x()))
    }

    /// Summary of the current fitted result.
    pub fn report(&self) -> std::result::Result<FitReport, FitFailure> {
        self.result
            .as_ref()
            .map(FitResult::report)
            .ok_or(FitFailure::NotFitted)
    }
}
