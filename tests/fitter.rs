//! End-to-end tests of the fitter: configure, fit, decompose, report.

use approx::assert_relative_eq;
use ndarray::Array1;
use peakfit_rs::fitter::{RenderStyle, SeriesRole};
use peakfit_rs::{FitFailure, Fitter, FitterState, LmConfig, PeakModel, ShapeKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Samples of the model described by `params` over `x`.
fn synthesize(shape: ShapeKind, params: &[f64], x: &Array1<f64>) -> Vec<f64> {
    PeakModel::from_vector(shape, params)
        .unwrap()
        .eval(x)
        .to_vec()
}

fn fitted_fitter(shape: ShapeKind, truth: &[f64], seed: &[f64], x: &Array1<f64>) -> Fitter {
    let y = synthesize(shape, truth, x);
    let mut fitter = Fitter::new();
    fitter.set_shape_kind(shape);
    fitter
        .set_data(x.as_slice().unwrap(), &y, (x[0], x[x.len() - 1]))
        .unwrap();
    fitter.set_params(seed).unwrap();
    fitter
}

#[test]
fn test_single_gaussian_scenario() {
    let x: Vec<f64> = (0..=10).map(f64::from).collect();
    let truth = [5.0, 10.0, 1.0, 0.0, 0.0];
    let y = synthesize(ShapeKind::Gaussian, &truth, &Array1::from(x.clone()));

    let mut fitter = Fitter::new();
    fitter.set_shape("Gaussian").unwrap();
    fitter.set_data(&x, &y, (0.0, 10.0)).unwrap();
    fitter.set_params(&truth).unwrap();

    let result = fitter.fit().unwrap();
    for (fitted, expected) in result.params.iter().zip(truth.iter()) {
        assert_relative_eq!(*fitted, *expected, epsilon = 1e-8);
    }
    assert_eq!(result.n_points, 11);
    assert_eq!(result.rounded_params(3), truth.to_vec());
}

#[test]
fn test_exact_seed_converges_for_every_shape() {
    let x = Array1::linspace(0.0, 10.0, 101);
    let cases = [
        (ShapeKind::Lorentzian, vec![4.0, 8.0, 1.5, 0.2, 1.0]),
        (ShapeKind::Gaussian, vec![6.0, 3.0, 0.8, -0.1, 2.0]),
        (ShapeKind::Voigt, vec![5.0, 10.0, 0.5, 0.7, 0.05, 0.5]),
    ];

    for (shape, truth) in cases {
        let mut fitter = fitted_fitter(shape, &truth, &truth, &x);
        let result = fitter.fit().unwrap();

        assert!(result.status.is_converged(), "{}", shape);
        for (fitted, expected) in result.params.iter().zip(truth.iter()) {
            assert_relative_eq!(*fitted, *expected, epsilon = 1e-8);
        }
        assert!(result.cost < 1e-20, "{}: cost {}", shape, result.cost);
        assert!(
            result.covariance.iter().all(|c| c.abs() < 1e-12),
            "{}: covariance not near zero",
            shape
        );
    }
}

#[test]
fn test_perturbed_seed_recovers_truth() {
    let x = Array1::linspace(0.0, 20.0, 201);
    let truth = [8.0, 12.0, 1.5, 0.05, 0.5];
    let seed = [8.6, 9.0, 2.2, 0.0, 0.0];

    let mut fitter = fitted_fitter(ShapeKind::Gaussian, &truth, &seed, &x);
    let result = fitter.fit().unwrap();
    for (fitted, expected) in result.params.iter().zip(truth.iter()) {
        assert_relative_eq!(*fitted, *expected, epsilon = 1e-5);
    }
    assert!(result.iterations > 0);
}

#[test]
fn test_peak_count_inference() {
    let mut fitter = Fitter::new();

    fitter.set_shape("Lorentzian").unwrap();
    assert_eq!(fitter.set_params(&[0.0; 3 * 4 + 2]).unwrap(), 4);

    fitter.set_shape("Gaussian").unwrap();
    assert_eq!(fitter.set_params(&[0.0; 2]).unwrap(), 0);

    fitter.set_shape("Voigt").unwrap();
    assert_eq!(fitter.set_params(&[0.0; 4 * 3 + 2]).unwrap(), 3);
    assert_eq!(fitter.peak_count(), 3);

    assert!(fitter.set_params(&[0.0; 3 * 3 + 2]).is_err());
}

#[test]
fn test_fit_failures_are_results() {
    let mut fitter = Fitter::new();
    let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [0.0, 1.0, 4.0, 1.0, 0.0, 0.0];

    fitter.set_data(&x, &y, (0.0, 5.0)).unwrap();
    assert!(matches!(fitter.fit(), Err(FitFailure::NoParameters)));

    fitter.set_params(&[2.0, 4.0, 1.0, 0.0, 0.0]).unwrap();
    fitter.set_data(&x, &y, (10.0, 20.0)).unwrap();
    assert!(matches!(fitter.fit(), Err(FitFailure::NoData)));
    assert!(matches!(fitter.decompose(), Err(FitFailure::NoData)));
    assert!(fitter.result().is_none());
}

#[test]
fn test_range_boundaries_are_inclusive() {
    let x: Vec<f64> = (0..=20).map(f64::from).collect();
    let truth = [10.0, 5.0, 2.0, 0.0, 1.0];
    let mut y = synthesize(ShapeKind::Lorentzian, &truth, &Array1::from(x.clone()));

    // Corrupt everything outside [4, 16]
    for (xv, yv) in x.iter().zip(y.iter_mut()) {
        if *xv < 4.0 || *xv > 16.0 {
            *yv = 1e6;
        }
    }

    let mut fitter = Fitter::new();
    fitter.set_data(&x, &y, (4.0, 16.0)).unwrap();
    fitter.set_params(&truth).unwrap();

    let data = fitter.data().unwrap();
    assert_eq!(data.len(), 13);
    assert_eq!(data.x()[0], 4.0);
    assert_eq!(data.x()[12], 16.0);

    let result = fitter.fit().unwrap();
    assert_eq!(result.n_points, 13);
    assert!(result.cost < 1e-20);
}

#[test]
fn test_decomposition_has_n_plus_two_series() {
    let x = Array1::linspace(0.0, 30.0, 301);
    let truth = [5.0, 4.0, 1.0, 15.0, 6.0, 2.0, 25.0, 3.0, 1.5, 0.02, 0.3];

    let mut fitter = fitted_fitter(ShapeKind::Gaussian, &truth, &truth, &x);
    fitter.fit().unwrap();

    let decomposition = fitter.decompose().unwrap();
    assert_eq!(decomposition.len(), 3 + 2);
    assert_eq!(decomposition.x, x);

    let first = &decomposition.series[0];
    let last = &decomposition.series[4];
    assert_eq!((first.role, first.style), (SeriesRole::Combined, RenderStyle::Line));
    assert_eq!((last.role, last.style), (SeriesRole::Baseline, RenderStyle::Line));
    for (i, series) in decomposition.series[1..4].iter().enumerate() {
        assert_eq!(series.role, SeriesRole::Peak(i));
        assert_eq!(series.style, RenderStyle::FillToBaseline);
    }

    // The second peak's series tops out at its intensity near its center
    let peak = &decomposition.series[2].y;
    assert_relative_eq!(peak[150], 6.0, epsilon = 1e-6);

    let summed = decomposition
        .series[1..]
        .iter()
        .fold(Array1::<f64>::zeros(x.len()), |acc, s| acc + &s.y);
    for (a, b) in decomposition.combined().unwrap().iter().zip(summed.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-10);
    }
}

#[test]
fn test_noisy_two_peak_lorentzian() {
    let x = Array1::linspace(0.0, 100.0, 401);
    let truth = [40.0, 50.0, 5.0, 60.0, 30.0, 8.0, 0.1, 2.0];

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let y: Vec<f64> = synthesize(ShapeKind::Lorentzian, &truth, &x)
        .into_iter()
        .map(|v| v + noise.sample(&mut rng))
        .collect();

    let mut fitter = Fitter::new();
    fitter.set_shape("Lorentzian").unwrap();
    fitter.set_data(x.as_slice().unwrap(), &y, (0.0, 100.0)).unwrap();
    fitter
        .set_params(&[38.5, 40.0, 7.0, 61.5, 25.0, 6.0, 0.0, 0.0])
        .unwrap();

    let result = fitter.fit().unwrap();
    let p = &result.params;
    assert_relative_eq!(p[0], 40.0, epsilon = 0.2);
    assert_relative_eq!(p[1], 50.0, epsilon = 1.5);
    assert_relative_eq!(p[2], 5.0, epsilon = 0.3);
    assert_relative_eq!(p[3], 60.0, epsilon = 0.3);
    assert_relative_eq!(p[4], 30.0, epsilon = 1.5);
    assert_relative_eq!(p[5], 8.0, epsilon = 0.5);
    assert_relative_eq!(p[6], 0.1, epsilon = 0.01);
    assert_relative_eq!(p[7], 2.0, epsilon = 0.5);

    // The fit explains the data down to the noise level
    let redchi = result.reduced_chi_square().unwrap();
    assert!(redchi > 0.15 && redchi < 0.4, "reduced chi-square {}", redchi);

    let errors = result.standard_errors();
    assert!(errors.iter().all(|e| e.is_finite() && *e > 0.0));
}

#[test]
fn test_failed_fit_keeps_previous_result() {
    let x = Array1::linspace(0.0, 20.0, 201);
    let truth = [8.0, 12.0, 1.5, 0.05, 0.5];
    let seed = [8.5, 10.0, 2.0, 0.0, 0.0];

    let mut fitter = fitted_fitter(ShapeKind::Gaussian, &truth, &seed, &x);
    let first = fitter.fit().unwrap().params.clone();

    fitter.set_config(LmConfig {
        max_iterations: 0,
        ..LmConfig::default()
    });
    match fitter.fit() {
        Err(FitFailure::NotConverged(message)) => assert!(message.contains("iterations")),
        other => panic!("Expected NotConverged, got {:?}", other.map(|r| r.params.clone())),
    }

    assert_eq!(fitter.state(), FitterState::Fitted);
    assert_eq!(fitter.result().unwrap().params, first);
    assert!(fitter.decompose().is_ok());
}

#[test]
fn test_too_few_points() {
    let mut fitter = Fitter::new();
    fitter.set_shape("Voigt").unwrap();
    fitter
        .set_data(&[1.0, 2.0, 3.0, 4.0, 5.0], &[0.0, 1.0, 3.0, 1.0, 0.0], (0.0, 10.0))
        .unwrap();
    fitter.set_params(&[3.0, 3.0, 0.5, 0.5, 0.0, 0.0]).unwrap();

    assert!(matches!(
        fitter.fit(),
        Err(FitFailure::TooFewPoints { points: 5, params: 6 })
    ));
}

#[test]
fn test_report_round_trip() {
    let x = Array1::linspace(0.0, 20.0, 201);
    let truth = [10.0, 7.0, 2.0, 0.0, 1.0];
    let mut fitter = fitted_fitter(ShapeKind::Lorentzian, &truth, &[9.5, 6.0, 2.5, 0.0, 0.5], &x);
    fitter.fit().unwrap();

    let report = fitter.report().unwrap();
    assert_eq!(report.shape, ShapeKind::Lorentzian);
    assert_eq!(report.peaks.len(), 1);
    assert_eq!(report.n_points, 201);

    let text = report.to_string();
    assert!(text.contains("center: 10.000"));
    assert!(text.contains("width: 2.000"));
    assert!(text.contains("intercept: 1.000"));

    let json = report.to_json().unwrap();
    let parsed = peakfit_rs::FitReport::from_json(&json).unwrap();
    assert_eq!(parsed.peaks.len(), 1);
    assert_relative_eq!(parsed.peaks[0].params[0].value, report.peaks[0].params[0].value);
}
