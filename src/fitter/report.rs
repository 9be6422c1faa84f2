//! Human-readable and JSON summaries of a fit.

use crate::error::Result;
use crate::model::ShapeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::result::FitResult;

/// Decimal places shown in [`FitReport`]'s `Display` output.
pub const DISPLAY_DECIMALS: u32 = 3;

/// Round `value` to `decimals` places, without producing `-0`.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale + 0.0
}

/// A fitted scalar and its one-sigma error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamEstimate {
    pub name: String,
    pub value: f64,
    /// `None` when the covariance could not be estimated.
    pub stderr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakEstimate {
    pub index: usize,
    pub params: Vec<ParamEstimate>,
}

/// Summary of a [`FitResult`].
///
/// Values keep full precision; only `Display` rounds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub shape: ShapeKind,
    pub peaks: Vec<PeakEstimate>,
    pub baseline: Vec<ParamEstimate>,
    pub cost: f64,
    pub reduced_chi_square: Option<f64>,
    pub n_points: usize,
    pub iterations: usize,
    pub func_evals: usize,
    pub message: String,
}

impl FitReport {
    pub fn from_result(result: &FitResult) -> Self {
        let shape = result.model.shape();
        let errors = result.standard_errors();
        let estimate = |name: &str, i: usize| ParamEstimate {
            name: name.to_string(),
            value: result.params[i],
            stderr: Some(errors[i]).filter(|e| e.is_finite()),
        };

        let arity = shape.arity();
        let peaks = (0..result.model.peak_count())
            .map(|p| PeakEstimate {
                index: p,
                params: shape
                    .param_names()
                    .iter()
                    .enumerate()
                    .map(|(k, name)| estimate(name, p * arity + k))
                    .collect(),
            })
            .collect();

        let offset = result.model.peak_count() * arity;
        let baseline = vec![estimate("slope", offset), estimate("intercept", offset + 1)];

        Self {
            shape,
            peaks,
            baseline,
            cost: result.cost,
            reduced_chi_square: result.reduced_chi_square(),
            n_points: result.n_points,
            iterations: result.iterations,
            func_evals: result.func_evals,
            message: result.message.clone(),
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn write_estimate(f: &mut fmt::Formatter<'_>, p: &ParamEstimate) -> fmt::Result {
    let d = DISPLAY_DECIMALS as usize;
    match p.stderr {
        Some(err) => writeln!(
            f,
            "    {}: {:.*} +/- {:.*}",
            p.name,
            d,
            round_to(p.value, DISPLAY_DECIMALS),
            d,
            round_to(err, DISPLAY_DECIMALS)
        ),
        None => writeln!(
            f,
            "    {}: {:.*} (error not estimated)",
            p.name,
            d,
            round_to(p.value, DISPLAY_DECIMALS)
        ),
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = DISPLAY_DECIMALS as usize;
        writeln!(f, "Fit Report:")?;
        writeln!(f, "  Shape: {}", self.shape)?;
        writeln!(f, "  Data points: {}", self.n_points)?;
        writeln!(f, "  Cost: {:.*}", d, round_to(self.cost, DISPLAY_DECIMALS))?;
        match self.reduced_chi_square {
            Some(redchi) => writeln!(
                f,
                "  Reduced chi-square: {:.*}",
                d,
                round_to(redchi, DISPLAY_DECIMALS)
            )?,
            None => writeln!(f, "  Reduced chi-square: undefined")?,
        }
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Message: {}", self.message)?;

        for peak in &self.peaks {
            writeln!(f, "  Peak {}:", peak.index + 1)?;
            for p in &peak.params {
                write_estimate(f, p)?;
            }
        }

        writeln!(f, "  Baseline:")?;
        for p in &self.baseline {
            write_estimate(f, p)?;
        }
        Ok(())
    }
}
