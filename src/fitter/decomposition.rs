//! Splitting a fitted model into its additive parts for display.

use crate::model::PeakModel;
use ndarray::Array1;

/// What a series in a [`Decomposition`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    /// Sum of all peaks and the baseline.
    Combined,
    /// A single peak, indexed from zero in parameter-vector order.
    Peak(usize),
    Baseline,
}

/// How a renderer should draw a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    Line,
    /// Filled region between the series and the baseline series.
    FillToBaseline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub role: SeriesRole,
    pub style: RenderStyle,
    pub y: Array1<f64>,
}

/// The x-axis of the fitted slice plus `[combined, peak_1, …, peak_N, baseline]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub x: Array1<f64>,
    pub series: Vec<Series>,
}

impl Decomposition {
    /// Evaluate every component of `model` over `x`.
    pub fn new(model: &PeakModel, x: &Array1<f64>) -> Self {
        let components = model.components(x);
        let last = components.len() - 1;

        let series = components
            .into_iter()
            .enumerate()
            .map(|(i, y)| {
                let (role, style) = if i == 0 {
                    (SeriesRole::Combined, RenderStyle::Line)
                } else if i == last {
                    (SeriesRole::Baseline, RenderStyle::Line)
                } else {
                    (SeriesRole::Peak(i - 1), RenderStyle::FillToBaseline)
                };
                Series { role, style, y }
            })
            .collect();

        Self {
            x: x.clone(),
            series,
        }
    }

    /// Number of series, N + 2 for N peaks.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The combined series, `None` if `series` holds no such entry.
    pub fn combined(&self) -> Option<&Array1<f64>> {
        self.find(SeriesRole::Combined)
    }

    pub fn baseline(&self) -> Option<&Array1<f64>> {
        self.find(SeriesRole::Baseline)
    }

    fn find(&self, role: SeriesRole) -> Option<&Array1<f64>> {
        self.series.iter().find(|s| s.role == role).map(|s| &s.y)
    }

    /// The individual peak series, in order.
    pub fn peaks(&self) -> impl Iterator<Item = &Array1<f64>> {
        self.series
            .iter()
            .filter(|s| matches!(s.role, SeriesRole::Peak(_)))
            .map(|s| &s.y)
    }
}
