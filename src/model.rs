//! Superposition model: typed peaks plus a linear baseline.
//!
//! The optimizer works on one flat parameter vector, laid out as
//! `[peak_1.., peak_2.., …, peak_N.., slope, intercept]` where each peak
//! contributes [`ShapeKind::arity`] scalars. [`PeakModel`] is the typed form of
//! that vector; conversion happens only at the optimizer boundary.

use crate::error::{FitError, Result};
use crate::problem::Problem;
use crate::shapes;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of trailing baseline parameters in a parameter vector.
pub const BASELINE_PARAMS: usize = 2;

/// Ratio between the FWHM and sigma of a Gaussian, 2 * sqrt(2 ln 2).
const GAUSSIAN_FWHM_PER_SIGMA: f64 = 2.3548;

/// The supported peak profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Lorentzian,
    Gaussian,
    Voigt,
}

impl ShapeKind {
    /// All shapes, in display order.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Lorentzian, ShapeKind::Gaussian, ShapeKind::Voigt];

    /// Number of parameters describing one peak of this shape.
    pub fn arity(self) -> usize {
        match self {
            ShapeKind::Lorentzian | ShapeKind::Gaussian => 3,
            ShapeKind::Voigt => 4,
        }
    }

    /// Field names of one peak, in parameter-vector order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ShapeKind::Lorentzian => &["center", "intensity", "width"],
            ShapeKind::Gaussian => &["center", "intensity", "sigma"],
            ShapeKind::Voigt => &["center", "intensity", "lorentzian_halfwidth", "gaussian_sigma"],
        }
    }

    /// Number of whole peaks encoded by a parameter vector of length `len`.
    ///
    /// Fails unless `len = N * arity + 2` for some N >= 0.
    pub fn peak_count(self, len: usize) -> Result<usize> {
        let arity = self.arity();
        if len < BASELINE_PARAMS || (len - BASELINE_PARAMS) % arity != 0 {
            return Err(FitError::ParameterLength { len, arity });
        }
        Ok((len - BASELINE_PARAMS) / arity)
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Lorentzian => "Lorentzian",
            ShapeKind::Gaussian => "Gaussian",
            ShapeKind::Voigt => "Voigt",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FitError::UnknownShape(s.to_string()))
    }
}

/// One peak, with the parameters of its shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Peak {
    /// `width` is the full width at half maximum.
    Lorentzian { center: f64, intensity: f64, width: f64 },
    /// `sigma` is the standard deviation.
    Gaussian { center: f64, intensity: f64, sigma: f64 },
    /// `intensity` is the height of the sampled maximum, see [`shapes::voigt`].
    Voigt {
        center: f64,
        intensity: f64,
        lorentzian_halfwidth: f64,
        gaussian_sigma: f64,
    },
}

impl Peak {
    /// Build a peak of `shape` from exactly `shape.arity()` values.
    pub fn from_slice(shape: ShapeKind, values: &[f64]) -> Result<Self> {
        if values.len() != shape.arity() {
            return Err(FitError::DimensionMismatch(format!(
                "{} peak takes {} parameters, got {}",
                shape,
                shape.arity(),
                values.len()
            )));
        }

        Ok(match shape {
            ShapeKind::Lorentzian => Peak::Lorentzian {
                center: values[0],
                intensity: values[1],
                width: values[2],
            },
            ShapeKind::Gaussian => Peak::Gaussian {
                center: values[0],
                intensity: values[1],
                sigma: values[2],
            },
            ShapeKind::Voigt => Peak::Voigt {
                center: values[0],
                intensity: values[1],
                lorentzian_halfwidth: values[2],
                gaussian_sigma: values[3],
            },
        })
    }

    /// Seed a peak from a rectangle drawn over the spectrum.
    ///
    /// The corners may come in any order. The rectangle's x-extent is taken as
    /// the FWHM and its height as the intensity; Voigt peaks split the width
    /// evenly between the Lorentzian and Gaussian parts. Returns `None` for a
    /// rectangle with zero width or height.
    pub fn from_selection(shape: ShapeKind, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Self> {
        if x0 == x1 || y0 == y1 {
            return None;
        }

        let (left, right) = (x0.min(x1), x0.max(x1));
        let (bottom, top) = (y0.min(y1), y0.max(y1));
        let center = (left + right) / 2.0;
        let intensity = top - bottom;
        let width = right - left;

        Some(match shape {
            ShapeKind::Lorentzian => Peak::Lorentzian {
                center,
                intensity,
                width,
            },
            ShapeKind::Gaussian => Peak::Gaussian {
                center,
                intensity,
                sigma: width / GAUSSIAN_FWHM_PER_SIGMA,
            },
            ShapeKind::Voigt => Peak::Voigt {
                center,
                intensity,
                lorentzian_halfwidth: width / 4.0,
                gaussian_sigma: width / (2.0 * GAUSSIAN_FWHM_PER_SIGMA),
            },
        })
    }

    pub fn shape(&self) -> ShapeKind {
        match self {
            Peak::Lorentzian { .. } => ShapeKind::Lorentzian,
            Peak::Gaussian { .. } => ShapeKind::Gaussian,
            Peak::Voigt { .. } => ShapeKind::Voigt,
        }
    }

    pub fn center(&self) -> f64 {
        match *self {
            Peak::Lorentzian { center, .. }
            | Peak::Gaussian { center, .. }
            | Peak::Voigt { center, .. } => center,
        }
    }

    pub fn intensity(&self) -> f64 {
        match *self {
            Peak::Lorentzian { intensity, .. }
            | Peak::Gaussian { intensity, .. }
            | Peak::Voigt { intensity, .. } => intensity,
        }
    }

    /// Parameters in vector order.
    pub fn values(&self) -> Vec<f64> {
        match *self {
            Peak::Lorentzian {
                center,
                intensity,
                width,
            } => vec![center, intensity, width],
            Peak::Gaussian {
                center,
                intensity,
                sigma,
            } => vec![center, intensity, sigma],
            Peak::Voigt {
                center,
                intensity,
                lorentzian_halfwidth,
                gaussian_sigma,
            } => vec![center, intensity, lorentzian_halfwidth, gaussian_sigma],
        }
    }

    /// Evaluate this peak alone.
    pub fn eval(&self, x: &Array1<f64>) -> Array1<f64> {
        match *self {
            Peak::Lorentzian {
                center,
                intensity,
                width,
            } => shapes::lorentzian(x, center, intensity, width),
            Peak::Gaussian {
                center,
                intensity,
                sigma,
            } => shapes::gaussian(x, center, intensity, sigma),
            Peak::Voigt {
                center,
                intensity,
                lorentzian_halfwidth,
                gaussian_sigma,
            } => shapes::voigt(x, center, intensity, lorentzian_halfwidth, gaussian_sigma),
        }
    }
}

/// The linear background `slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Baseline {
    pub slope: f64,
    pub intercept: f64,
}

impl Baseline {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn eval(&self, x: &Array1<f64>) -> Array1<f64> {
        shapes::linear(x, self.slope, self.intercept)
    }
}

/// N peaks of a single shape on top of a linear baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakModel {
    shape: ShapeKind,
    peaks: Vec<Peak>,
    baseline: Baseline,
}

impl PeakModel {
    /// Build a model from typed peaks, which must all have the given shape.
    pub fn new(shape: ShapeKind, peaks: Vec<Peak>, baseline: Baseline) -> Result<Self> {
        if let Some(other) = peaks.iter().find(|p| p.shape() != shape) {
            return Err(FitError::DimensionMismatch(format!(
                "{} peak in a {} model",
                other.shape(),
                shape
            )));
        }
        Ok(Self {
            shape,
            peaks,
            baseline,
        })
    }

    /// Parse a flat parameter vector, `N * arity` peak values then the
    /// baseline slope and intercept.
    pub fn from_vector(shape: ShapeKind, values: &[f64]) -> Result<Self> {
        let n_peaks = shape.peak_count(values.len())?;
        let arity = shape.arity();

        let peaks = values[..n_peaks * arity]
            .chunks_exact(arity)
            .map(|group| Peak::from_slice(shape, group))
            .collect::<Result<Vec<_>>>()?;

        let tail = &values[n_peaks * arity..];
        Ok(Self {
            shape,
            peaks,
            baseline: Baseline::new(tail[0], tail[1]),
        })
    }

    /// Flatten back into the parameter-vector layout.
    pub fn to_vector(&self) -> Array1<f64> {
        self.peaks
            .iter()
            .flat_map(|p| p.values())
            .chain([self.baseline.slope, self.baseline.intercept])
            .collect()
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    /// Length of the flat parameter vector.
    pub fn parameter_count(&self) -> usize {
        self.peaks.len() * self.shape.arity() + BASELINE_PARAMS
    }

    /// Sum of all peaks plus the baseline.
    pub fn eval(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut total = Array1::zeros(x.len());
        for peak in &self.peaks {
            total += &peak.eval(x);
        }
        total += &self.baseline.eval(x);
        total
    }

    /// The combined model, each peak, and the baseline, in that order.
    pub fn components(&self, x: &Array1<f64>) -> Vec<Array1<f64>> {
        let mut series = Vec::with_capacity(self.peaks.len() + 2);
        series.push(self.eval(x));
        series.extend(self.peaks.iter().map(|p| p.eval(x)));
        series.push(self.baseline.eval(x));
        series
    }
}

/// Least-squares problem fitting a [`PeakModel`] of a fixed shape and peak
/// count to (x, y) samples.
///
/// Residuals are `model(x) - y`.
pub struct SuperpositionProblem {
    shape: ShapeKind,
    n_params: usize,
    x: Array1<f64>,
    y: Array1<f64>,
}

impl SuperpositionProblem {
    /// Create a problem for `n_peaks` peaks of `shape` over the given samples.
    pub fn new(shape: ShapeKind, n_peaks: usize, x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "x has {} samples but y has {}",
                x.len(),
                y.len()
            )));
        }

        Ok(Self {
            shape,
            n_params: n_peaks * shape.arity() + BASELINE_PARAMS,
            x,
            y,
        })
    }

    /// Parse a parameter vector into the typed model.
    pub fn model(&self, params: &Array1<f64>) -> Result<PeakModel> {
        if params.len() != self.n_params {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.n_params,
                params.len()
            )));
        }
        PeakModel::from_vector(self.shape, &params.to_vec())
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }
}

impl Problem for SuperpositionProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let model = self.model(params)?;
        Ok(model.eval(&self.x) - &self.y)
    }

    fn parameter_count(&self) -> usize {
        self.n_params
    }

    fn residual_count(&self) -> usize {
        self.y.len()
    }
}
