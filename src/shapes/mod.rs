//! Peak-shape functions for spectral fitting.
//!
//! Each function maps an x-array and a few scalar parameters to a y-array of
//! the same length. Lorentzian and Gaussian peaks reach exactly `intensity` at
//! their center; the Voigt profile is rescaled so its maximum over the
//! evaluated x-array equals `intensity`.

mod faddeeva;

pub use faddeeva::faddeeva;

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Stand-in for a zero Gaussian sigma in the Voigt profile.
pub const VOIGT_MIN_SIGMA: f64 = 1e-10;

/// A Lorentzian peak.
///
/// f(x) = intensity * width² / (4 (x - center)² + width²)
///
/// `width` is the full width at half maximum.
pub fn lorentzian(x: &Array1<f64>, center: f64, intensity: f64, width: f64) -> Array1<f64> {
    let w2 = width * width;
    x.mapv(|xv| {
        let d = xv - center;
        intensity * w2 / (4.0 * d * d + w2)
    })
}

/// A Gaussian peak.
///
/// f(x) = intensity * exp(-(x - center)² / (2 sigma²))
pub fn gaussian(x: &Array1<f64>, center: f64, intensity: f64, sigma: f64) -> Array1<f64> {
    x.mapv(|xv| {
        let d = xv - center;
        intensity * (-0.5 * d * d / (sigma * sigma)).exp()
    })
}

/// A Voigt peak: the convolution of a Lorentzian with half width
/// `lorentzian_halfwidth` and a Gaussian with standard deviation
/// `gaussian_sigma`.
///
/// The normalized profile is `Re w(z) / (sigma sqrt(2π))` with
/// `z = (x - center + i γ) / (sigma sqrt(2))` and `w` the Faddeeva function.
/// That profile is then scaled by `intensity / max(profile)`, the maximum taken
/// over this call's `x`, so the returned array peaks at `intensity`. A zero
/// sigma is replaced by [`VOIGT_MIN_SIGMA`].
pub fn voigt(
    x: &Array1<f64>,
    center: f64,
    intensity: f64,
    lorentzian_halfwidth: f64,
    gaussian_sigma: f64,
) -> Array1<f64> {
    let sigma = if gaussian_sigma == 0.0 {
        VOIGT_MIN_SIGMA
    } else {
        gaussian_sigma
    };

    let scale = sigma * std::f64::consts::SQRT_2;
    let norm = sigma * (2.0 * PI).sqrt();
    let profile = x.mapv(|xv| {
        let z = Complex64::new(xv - center, lorentzian_halfwidth) / scale;
        faddeeva(z).re / norm
    });

    if profile.is_empty() {
        return profile;
    }

    // Rescale so the sampled maximum equals the intensity
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let height = intensity / max;
    profile * height
}

/// The linear baseline a * x + b.
pub fn linear(x: &Array1<f64>, a: f64, b: f64) -> Array1<f64> {
    x.mapv(|xv| a * xv + b)
}
