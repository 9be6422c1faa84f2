//! Benchmarks for peak shapes and multi-peak fits.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use num_complex::Complex64;
use peakfit_rs::shapes::{faddeeva, gaussian, lorentzian, voigt};
use peakfit_rs::{Fitter, PeakModel, ShapeKind};

fn bench_shapes(c: &mut Criterion) {
    let x = Array1::linspace(0.0, 100.0, 1000);
    let mut group = c.benchmark_group("shapes");

    group.bench_function("lorentzian_1000", |b| {
        b.iter(|| lorentzian(black_box(&x), 50.0, 10.0, 5.0))
    });
    group.bench_function("gaussian_1000", |b| {
        b.iter(|| gaussian(black_box(&x), 50.0, 10.0, 5.0))
    });
    group.bench_function("voigt_1000", |b| {
        b.iter(|| voigt(black_box(&x), 50.0, 10.0, 2.0, 3.0))
    });
    group.finish();

    // Each branch of the Faddeeva evaluation
    let mut group = c.benchmark_group("faddeeva");
    for (label, z) in [
        ("series", Complex64::new(0.5, 0.5)),
        ("continued_fraction", Complex64::new(6.0, 3.0)),
        ("lower_half_plane", Complex64::new(1.0, -0.5)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &z, |b, z| {
            b.iter(|| faddeeva(black_box(*z)))
        });
    }
    group.finish();
}

fn bench_fits(c: &mut Criterion) {
    let x = Array1::linspace(0.0, 100.0, 401);
    let mut group = c.benchmark_group("fit");
    group.sample_size(20);

    for shape in ShapeKind::ALL {
        let (truth, seed) = match shape {
            ShapeKind::Voigt => (
                vec![40.0, 50.0, 2.0, 2.0, 60.0, 30.0, 3.0, 2.0, 0.1, 2.0],
                vec![39.0, 40.0, 3.0, 1.5, 61.0, 25.0, 2.0, 3.0, 0.0, 0.0],
            ),
            _ => (
                vec![40.0, 50.0, 5.0, 60.0, 30.0, 8.0, 0.1, 2.0],
                vec![39.0, 40.0, 7.0, 61.0, 25.0, 6.0, 0.0, 0.0],
            ),
        };

        let y = match PeakModel::from_vector(shape, &truth) {
            Ok(model) => model.eval(&x).to_vec(),
            Err(err) => panic!("invalid benchmark model: {}", err),
        };

        group.bench_with_input(BenchmarkId::new("two_peaks", shape), &seed, |b, seed| {
            b.iter(|| {
                let mut fitter = Fitter::new();
                fitter.set_shape_kind(shape);
                fitter.set_data(x.as_slice().unwrap(), &y, (0.0, 100.0)).unwrap();
                fitter.set_params(seed).unwrap();
                fitter.fit().map(|r| r.cost).ok()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_shapes, bench_fits);
criterion_main!(benches);
