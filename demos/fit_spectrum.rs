//! Fit two overlapping peaks in a synthetic noisy spectrum.
//!
//! Run with `RUST_LOG=debug` to see the solver iterations.

use ndarray::Array1;
use peakfit_rs::fitter::SeriesRole;
use peakfit_rs::{Fitter, PeakModel, ShapeKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Peak fitting example");
    println!("====================\n");

    // Two Voigt peaks on a sloped background
    let x = Array1::linspace(0.0, 100.0, 501);
    let truth = PeakModel::from_vector(
        ShapeKind::Voigt,
        &[42.0, 40.0, 2.0, 2.5, 55.0, 25.0, 3.0, 1.5, 0.05, 3.0],
    )?;
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.4)?;
    let y: Vec<f64> = truth
        .eval(&x)
        .iter()
        .map(|v| v + noise.sample(&mut rng))
        .collect();
    let x = x.to_vec();

    let mut fitter = Fitter::new();
    fitter.set_shape("Voigt")?;
    fitter.set_data(&x, &y, (20.0, 80.0))?;

    // Seed each peak from a rough box around it, as a user would drag one
    fitter.push_selection(38.0, 3.0, 46.0, 45.0)?;
    fitter.push_selection(50.0, 3.0, 60.0, 30.0)?;
    println!("Seeded {} peaks\n", fitter.peak_count());

    match fitter.fit() {
        Ok(result) => println!("Fitted parameters: {:?}\n", result.rounded_params(3)),
        Err(failure) => {
            println!("Fit failed: {}", failure);
            return Ok(());
        }
    }

    println!("{}", fitter.report()?);

    let decomposition = fitter.decompose()?;
    println!("Decomposition over {} points:", decomposition.x.len());
    for series in &decomposition.series {
        let max = series.y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let label = match series.role {
            SeriesRole::Combined => "combined".to_string(),
            SeriesRole::Peak(i) => format!("peak {}", i + 1),
            SeriesRole::Baseline => "baseline".to_string(),
        };
        println!("  {:<10} {:?}, max {:.3}", label, series.style, max);
    }

    println!("\nReport as JSON:\n{}", fitter.report()?.to_json()?);
    Ok(())
}
