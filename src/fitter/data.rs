//! The (x, y) samples a fit runs against.

use crate::error::{FitError, Result};
use ndarray::Array1;

/// Samples restricted to a closed x-interval.
///
/// Order is preserved from the input; x need not be sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSlice {
    x: Array1<f64>,
    y: Array1<f64>,
    range: (f64, f64),
}

impl SpectrumSlice {
    /// Keep the samples with `x_min <= x <= x_max`.
    ///
    /// An interval that excludes every sample gives an empty slice, not an
    /// error. Fails only when `x` and `y` differ in length.
    pub fn new(x: &[f64], y: &[f64], (x_min, x_max): (f64, f64)) -> Result<Self> {
        if x.len() != y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "x has {} samples but y has {}",
                x.len(),
                y.len()
            )));
        }

        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter(|(xv, _)| x_min <= **xv && **xv <= x_max)
            .map(|(xv, yv)| (*xv, *yv))
            .unzip();

        Ok(Self {
            x: Array1::from(xs),
            y: Array1::from(ys),
            range: (x_min, x_max),
        })
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// The interval the slice was cut with.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
