//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fit -> predictions at the observations -> R² -> dense overlay grid
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Each call is self-contained: nothing is cached between runs.

use crate::domain::{AnalysisConfig, FitResult, ObservationSet};
use crate::error::FitError;
use crate::fit::fit_with;
use crate::math::r_squared;
use crate::models::predict;

/// Run a full analysis with default settings.
pub fn run_analysis(observations: &ObservationSet) -> Result<FitResult, FitError> {
    run_analysis_with(observations, &AnalysisConfig::default())
}

/// Run a full analysis with explicit settings.
pub fn run_analysis_with(
    observations: &ObservationSet,
    config: &AnalysisConfig,
) -> Result<FitResult, FitError> {
    if config.grid_points < 2 {
        return Err(FitError::invalid_input(format!(
            "grid needs at least 2 points (got {})",
            config.grid_points
        )));
    }
    if !(config.grid_extent.is_finite() && config.grid_extent > 0.0) {
        return Err(FitError::invalid_input(format!(
            "grid extent must be finite and > 0 (got {})",
            config.grid_extent
        )));
    }

    // 1) Fit the parameters (validates the observations).
    let fit = fit_with(observations, &config.fit)?;
    let params = fit.params;

    // 2) Predictions and residuals at the observed substrate values.
    let substrate = observations.substrates();
    let observed = observations.velocities();
    let predicted = predict(params, &substrate);
    let residuals: Vec<f64> = observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| o - p)
        .collect();

    // 3) Goodness of fit.
    let r_squared = r_squared(&observed, &predicted)?;
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let rmse = (sse / observations.len() as f64).sqrt();

    // 4) Dense overlay grid over [0, extent · max S].
    let s_max = substrate.iter().copied().fold(0.0, f64::max);
    let grid_substrate = linspace(0.0, config.grid_extent * s_max, config.grid_points);
    let grid_predicted = predict(params, &grid_substrate);

    log::info!(
        "fit n={} vmax={:.5} km={:.5} r2={:.5} ({} step(s), {})",
        observations.len(),
        params.vmax,
        params.km,
        r_squared,
        fit.iterations,
        fit.termination.label()
    );

    Ok(FitResult {
        params,
        r_squared,
        predicted,
        residuals,
        grid_substrate,
        grid_predicted,
        sse,
        rmse,
        iterations: fit.iterations,
    })
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KineticParams;
    use crate::fit::FitOptions;
    use crate::models::rate;

    fn example() -> ObservationSet {
        ObservationSet::from_pairs([
            (0.5, 0.42),
            (1.0, 0.70),
            (2.0, 1.00),
            (4.0, 1.33),
            (8.0, 1.60),
            (16.0, 1.78),
        ])
    }

    #[test]
    fn linspace_endpoints() {
        let g = linspace(0.0, 17.6, 100);
        assert_eq!(g.len(), 100);
        assert_eq!(g[0], 0.0);
        assert_eq!(g[99], 17.6);
        assert!(g.windows(2).all(|w| w[1] > w[0]));
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }

    #[test]
    fn textbook_example_end_to_end() {
        let result = run_analysis(&example()).unwrap();
        assert!((result.params.vmax - 2.0).abs() < 0.1);
        assert!((result.params.km - 2.0).abs() < 0.2);
        assert!(result.r_squared > 0.99);
        assert!(result.r_squared <= 1.0);
    }

    #[test]
    fn grid_spans_extended_range() {
        let result = run_analysis(&example()).unwrap();
        assert_eq!(result.grid_substrate.len(), 100);
        assert_eq!(result.grid_predicted.len(), 100);
        assert_eq!(result.grid_substrate[0], 0.0);
        assert!((result.grid_substrate[99] - 17.6).abs() < 1e-12);
        assert_eq!(result.grid_predicted[0], 0.0);
    }

    #[test]
    fn derived_vectors_use_one_parameter_pair() {
        let obs = example();
        let result = run_analysis(&obs).unwrap();
        let KineticParams { vmax, km } = result.params;
        for (p, s) in result.predicted.iter().zip(obs.substrates()) {
            assert_eq!(*p, rate(s, vmax, km));
        }
        for (p, s) in result.grid_predicted.iter().zip(result.grid_substrate.iter()) {
            assert_eq!(*p, rate(*s, vmax, km));
        }
        for ((r, p), v) in result.residuals.iter().zip(result.predicted.iter()).zip(obs.velocities()) {
            assert_eq!(*r, v - p);
        }
    }

    #[test]
    fn custom_grid() {
        let config = AnalysisConfig {
            grid_points: 11,
            grid_extent: 2.0,
            fit: FitOptions::default(),
        };
        let result = run_analysis_with(&example(), &config).unwrap();
        assert_eq!(result.grid_substrate.len(), 11);
        assert_eq!(result.grid_substrate[10], 32.0);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let config = AnalysisConfig {
            grid_points: 1,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            run_analysis_with(&example(), &config),
            Err(FitError::InvalidInput(_))
        ));
    }

    #[test]
    fn failures_leave_nothing_behind() {
        let bad = ObservationSet::from_pairs((1..=10).map(|i| (i as f64, 5.0)));
        assert!(matches!(run_analysis(&bad), Err(FitError::DegenerateData(_))));
        // A subsequent run on good data is unaffected.
        assert!(run_analysis(&example()).is_ok());
    }
}
