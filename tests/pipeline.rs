use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use mm_kinetics::app::pipeline::{run_analysis, run_analysis_with};
use mm_kinetics::domain::{AnalysisConfig, InitialGuess, ObservationSet};
use mm_kinetics::error::FitError;
use mm_kinetics::fit::{FitOptions, fit};
use mm_kinetics::models::rate;

fn textbook() -> ObservationSet {
    ObservationSet::from_pairs([
        (0.5, 0.42),
        (1.0, 0.70),
        (2.0, 1.00),
        (4.0, 1.33),
        (8.0, 1.60),
        (16.0, 1.78),
    ])
}

fn synthetic(vmax: f64, km: f64) -> ObservationSet {
    let s = [0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
    ObservationSet::from_pairs(s.iter().map(|&s| (s, rate(s, vmax, km))))
}

#[test]
fn textbook_example_recovers_generating_parameters() {
    let result = run_analysis(&textbook()).unwrap();
    assert!((result.params.vmax - 2.0).abs() <= 0.1, "vmax={}", result.params.vmax);
    assert!((result.params.km - 2.0).abs() <= 0.2, "km={}", result.params.km);
    assert!(result.r_squared > 0.99);
}

#[test]
fn noise_free_data_is_recovered_exactly() {
    let obs = synthetic(3.5, 0.8);
    let result = run_analysis(&obs).unwrap();
    assert_relative_eq!(result.params.vmax, 3.5, max_relative = 1e-3);
    assert_relative_eq!(result.params.km, 0.8, max_relative = 1e-3);
    assert_relative_eq!(result.r_squared, 1.0, epsilon = 1e-9);
}

#[test]
fn molar_scale_data_is_recovered() {
    // Substrate in mol/L, velocity in mol/L/s.
    let (vmax, km) = (2e-9, 2e-6);
    let s = [0.25e-6, 0.5e-6, 1e-6, 2e-6, 4e-6, 8e-6, 16e-6];
    let obs = ObservationSet::from_pairs(s.iter().map(|&s| (s, rate(s, vmax, km))));

    let result = run_analysis(&obs).unwrap();
    assert_relative_eq!(result.params.vmax, vmax, max_relative = 1e-3);
    assert_relative_eq!(result.params.km, km, max_relative = 1e-3);
    assert_relative_eq!(result.r_squared, 1.0, epsilon = 1e-9);
    assert!(result.iterations > 1, "iterations={}", result.iterations);
}

#[test]
fn noisy_data_scores_strictly_between_zero_and_one() {
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let pairs: Vec<(f64, f64)> = synthetic(2.0, 1.5)
        .points()
        .iter()
        .map(|p| (p.substrate, p.velocity + noise.sample(&mut rng)))
        .collect();

    let result = run_analysis(&ObservationSet::from_pairs(pairs)).unwrap();
    assert!(result.r_squared > 0.0 && result.r_squared < 1.0, "r2={}", result.r_squared);
}

#[test]
fn starting_point_does_not_change_a_well_posed_optimum() {
    let obs = textbook();
    let config = AnalysisConfig {
        fit: FitOptions {
            initial_guess: InitialGuess::Fixed { vmax: 1.0, km: 1.0 },
            ..FitOptions::default()
        },
        ..AnalysisConfig::default()
    };
    let a = run_analysis(&obs).unwrap();
    let b = run_analysis_with(&obs, &config).unwrap();
    assert_relative_eq!(a.params.vmax, b.params.vmax, max_relative = 1e-6);
    assert_relative_eq!(a.params.km, b.params.km, max_relative = 1e-6);
}

#[test]
fn zero_and_one_observation_are_insufficient() {
    assert_eq!(
        fit(&ObservationSet::default()),
        Err(FitError::InsufficientData { n: 0, required: 2 })
    );
    let one = ObservationSet::from_pairs([(1.0, 0.5)]);
    assert!(matches!(
        run_analysis(&one),
        Err(FitError::InsufficientData { n: 1, .. })
    ));
}

#[test]
fn constant_velocity_is_degenerate() {
    let flat = ObservationSet::from_pairs((1..=10).map(|i| (i as f64, 5.0)));
    assert!(matches!(run_analysis(&flat), Err(FitError::DegenerateData(_))));
}

#[test]
fn parameters_stay_non_negative_on_decreasing_data() {
    let decreasing = ObservationSet::from_pairs([(1.0, 4.0), (2.0, 3.0), (3.0, 2.0), (4.0, 1.0)]);
    let result = run_analysis(&decreasing).unwrap();
    assert!(result.params.vmax >= 0.0);
    assert!(result.params.km >= 0.0);
    assert!(result.params.km < 1e-9);
}

#[test]
fn iteration_budget_is_enforced() {
    let config = AnalysisConfig {
        fit: FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        },
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        run_analysis_with(&textbook(), &config),
        Err(FitError::FitDidNotConverge { .. })
    ));
}
