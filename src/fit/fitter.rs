//! Michaelis–Menten parameter fitting.
//!
//! Given:
//! - substrate concentrations `S_i`
//! - observed initial velocities `v_i`
//!
//! we solve
//!
//! ```text
//! minimize Σ (v_i - Vmax·S_i / (Km + S_i))²   subject to Vmax ≥ 0, Km ≥ 0
//! ```
//!
//! with the bounded Levenberg–Marquardt solver in `math::lm`.
//!
//! The optimizer needs a starting point. By default it is taken from the data
//! (`Vmax₀ = max v`, `Km₀ = median S`): the largest velocity is a lower bound on
//! the plateau and the median substrate sits inside the sampled range, which is
//! where the half-saturation point must be for the data to identify `Km`.

use nalgebra::DMatrix;

use crate::domain::{InitialGuess, KineticParams, ObservationSet, PARAM_COUNT};
use crate::error::FitError;
use crate::math::{LeastSquaresProblem, LmFailure, LmOptions, Termination, median, minimize};
use crate::models::{rate, rate_gradient};

/// Fallback starting value when the data-driven guess is not strictly positive.
const FALLBACK_GUESS: f64 = 1.0;

/// Optimizer settings for a single fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub initial_guess: InitialGuess,
    /// Iteration budget; exceeding it is `FitDidNotConverge`.
    pub max_iterations: usize,
    /// Relative SSE-reduction tolerance.
    pub ftol: f64,
    /// Relative step tolerance.
    pub xtol: f64,
    /// Scaled projected-gradient tolerance (cosine of `r` and each Jacobian column).
    pub gtol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        let lm = LmOptions::default();
        Self {
            initial_guess: InitialGuess::DataDriven,
            max_iterations: lm.max_iterations,
            ftol: lm.ftol,
            xtol: lm.xtol,
            gtol: lm.gtol,
        }
    }
}

impl FitOptions {
    fn lm_options(&self) -> LmOptions {
        LmOptions {
            max_iterations: self.max_iterations,
            ftol: self.ftol,
            xtol: self.xtol,
            gtol: self.gtol,
            ..LmOptions::default()
        }
    }
}

/// Fitted parameters plus solver diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamFit {
    pub params: KineticParams,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    /// Accepted optimizer steps.
    pub iterations: usize,
    pub termination: Termination,
}

struct MichaelisMentenProblem<'a> {
    substrate: &'a [f64],
    velocity: &'a [f64],
}

impl LeastSquaresProblem for MichaelisMentenProblem<'_> {
    fn residual_dim(&self) -> usize {
        self.substrate.len()
    }

    fn param_dim(&self) -> usize {
        PARAM_COUNT
    }

    fn residuals(&self, params: &[f64], out: &mut [f64]) {
        let (vmax, km) = (params[0], params[1]);
        for (i, (&s, &v)) in self.substrate.iter().zip(self.velocity.iter()).enumerate() {
            out[i] = rate(s, vmax, km) - v;
        }
    }

    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>) {
        let (vmax, km) = (params[0], params[1]);
        for (i, &s) in self.substrate.iter().enumerate() {
            let [d_vmax, d_km] = rate_gradient(s, vmax, km);
            out[(i, 0)] = d_vmax;
            out[(i, 1)] = d_km;
        }
    }

    fn project(&self, params: &mut [f64]) {
        for p in params.iter_mut() {
            *p = p.max(0.0);
        }
    }
}

/// Fit `(Vmax, Km)` with default options.
pub fn fit(observations: &ObservationSet) -> Result<KineticParams, FitError> {
    fit_with(observations, &FitOptions::default()).map(|f| f.params)
}

/// Fit `(Vmax, Km)` with explicit options.
pub fn fit_with(observations: &ObservationSet, opts: &FitOptions) -> Result<ParamFit, FitError> {
    validate_observations(observations)?;

    let substrate = observations.substrates();
    let velocity = observations.velocities();
    let start = initial_guess(observations, opts.initial_guess)?;

    log::debug!(
        "fitting n={} from vmax0={:.6}, km0={:.6}",
        observations.len(),
        start.vmax,
        start.km
    );

    let problem = MichaelisMentenProblem {
        substrate: &substrate,
        velocity: &velocity,
    };

    let report = minimize(&problem, &start.to_vec(), &opts.lm_options()).map_err(|failure| {
        log::warn!("fit failed: {failure}");
        match failure {
            LmFailure::IterationLimit { iterations, .. } => FitError::FitDidNotConverge {
                iterations,
                reason: "iteration limit reached before meeting tolerance".to_string(),
            },
            LmFailure::NonFinite { iterations } => FitError::FitDidNotConverge {
                iterations,
                reason: "non-finite residuals".to_string(),
            },
            LmFailure::InvalidProblem(msg) => FitError::invalid_input(msg),
        }
    })?;

    let params = KineticParams::from_slice(&report.params).ok_or_else(|| {
        FitError::invalid_input("optimizer returned the wrong number of parameters")
    })?;
    if !(params.vmax.is_finite() && params.km.is_finite() && report.sse.is_finite()) {
        return Err(FitError::FitDidNotConverge {
            iterations: report.iterations,
            reason: "parameters diverged to non-finite values".to_string(),
        });
    }

    log::debug!(
        "fit finished after {} step(s) ({}): vmax={:.6}, km={:.6}, sse={:.6e}",
        report.iterations,
        report.termination.label(),
        params.vmax,
        params.km,
        report.sse
    );

    Ok(ParamFit {
        params,
        sse: report.sse,
        iterations: report.iterations,
        termination: report.termination,
    })
}

/// Check that an observation set can be fitted.
///
/// Order matters: malformed values are reported before the data-shape checks.
pub fn validate_observations(observations: &ObservationSet) -> Result<(), FitError> {
    for (i, p) in observations.points().iter().enumerate() {
        if !(p.substrate.is_finite() && p.velocity.is_finite()) {
            return Err(FitError::invalid_input(format!(
                "observation {} has a non-finite value (substrate={}, velocity={})",
                i + 1,
                p.substrate,
                p.velocity
            )));
        }
        if p.substrate < 0.0 {
            return Err(FitError::invalid_input(format!(
                "observation {} has a negative substrate concentration ({})",
                i + 1,
                p.substrate
            )));
        }
    }

    let n = observations.len();
    if n < PARAM_COUNT {
        return Err(FitError::InsufficientData {
            n,
            required: PARAM_COUNT,
        });
    }

    let points = observations.points();
    let first = points[0];
    if points.iter().all(|p| p.substrate == first.substrate) {
        return Err(FitError::degenerate(format!(
            "all substrate concentrations are identical ({})",
            first.substrate
        )));
    }
    if points.iter().all(|p| p.velocity == first.velocity) {
        return Err(FitError::degenerate(format!(
            "all velocities are identical ({})",
            first.velocity
        )));
    }

    Ok(())
}

/// Resolve the optimizer's starting point.
pub fn initial_guess(
    observations: &ObservationSet,
    guess: InitialGuess,
) -> Result<KineticParams, FitError> {
    match guess {
        InitialGuess::DataDriven => {
            let vmax0 = observations
                .velocities()
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            let km0 = median(&observations.substrates()).unwrap_or(FALLBACK_GUESS);
            Ok(KineticParams::new(positive_or_fallback(vmax0), positive_or_fallback(km0)))
        }
        InitialGuess::Fixed { vmax, km } => {
            if !(vmax.is_finite() && km.is_finite()) {
                return Err(FitError::invalid_input(format!(
                    "initial guess must be finite (vmax0={vmax}, km0={km})"
                )));
            }
            Ok(KineticParams::new(vmax.max(0.0), km.max(0.0)))
        }
    }
}

fn positive_or_fallback(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        FALLBACK_GUESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn synthetic(vmax: f64, km: f64, substrates: &[f64]) -> ObservationSet {
        ObservationSet::from_pairs(substrates.iter().map(|&s| (s, rate(s, vmax, km))))
    }

    #[test]
    fn recovers_parameters_from_noise_free_data() {
        let s = [0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0];
        let params = fit(&synthetic(2.0, 2.0, &s)).unwrap();
        assert!((params.vmax - 2.0).abs() / 2.0 < 1e-3, "vmax={}", params.vmax);
        assert!((params.km - 2.0).abs() / 2.0 < 1e-3, "km={}", params.km);
    }

    #[test]
    fn recovers_parameters_with_zero_substrate_point() {
        let s = [0.0, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0];
        let params = fit(&synthetic(3.5, 0.8, &s)).unwrap();
        assert!((params.vmax - 3.5).abs() / 3.5 < 1e-3);
        assert!((params.km - 0.8).abs() / 0.8 < 1e-3);
    }

    #[test]
    fn fits_textbook_example() {
        let params = fit(&example()).unwrap();
        assert!((params.vmax - 2.0).abs() < 0.1, "vmax={}", params.vmax);
        assert!((params.km - 2.0).abs() < 0.2, "km={}", params.km);
    }

    #[test]
    fn decreasing_data_pins_km_to_bound() {
        let obs = ObservationSet::from_pairs([(1.0, 4.0), (2.0, 3.0), (3.0, 2.0), (4.0, 1.0)]);
        let fit = fit_with(&obs, &FitOptions::default()).unwrap();
        assert!(fit.params.km >= 0.0 && fit.params.km < 1e-9, "km={}", fit.params.km);
        // With Km = 0 the model is the constant Vmax, so the best Vmax is the mean.
        assert!((fit.params.vmax - 2.5).abs() < 1e-6, "vmax={}", fit.params.vmax);
    }

    #[test]
    fn parameters_stay_non_negative() {
        let obs = ObservationSet::from_pairs([(1.0, -1.0), (2.0, -0.5), (4.0, -0.2), (8.0, 0.1)]);
        let fit = fit_with(&obs, &FitOptions::default()).unwrap();
        assert!(fit.params.vmax >= 0.0);
        assert!(fit.params.km >= 0.0);
    }

    #[test]
    fn insufficient_data() {
        let empty = ObservationSet::default();
        assert_eq!(
            fit(&empty),
            Err(FitError::InsufficientData { n: 0, required: 2 })
        );
        let one = ObservationSet::from_pairs([(1.0, 1.0)]);
        assert_eq!(fit(&one), Err(FitError::InsufficientData { n: 1, required: 2 }));
    }

    #[test]
    fn constant_velocity_is_degenerate() {
        let obs = ObservationSet::from_pairs((1..=10).map(|i| (i as f64, 5.0)));
        assert!(matches!(fit(&obs), Err(FitError::DegenerateData(_))));
    }

    #[test]
    fn constant_substrate_is_degenerate() {
        let obs = ObservationSet::from_pairs([(2.0, 1.0), (2.0, 1.2), (2.0, 0.9)]);
        assert!(matches!(fit(&obs), Err(FitError::DegenerateData(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let nan = ObservationSet::from_pairs([(1.0, f64::NAN), (2.0, 1.0)]);
        assert!(matches!(fit(&nan), Err(FitError::InvalidInput(_))));
        let negative = ObservationSet::from_pairs([(-1.0, 0.5), (2.0, 1.0)]);
        assert!(matches!(fit(&negative), Err(FitError::InvalidInput(_))));
    }

    #[test]
    fn iteration_budget_exhaustion_is_reported() {
        let opts = FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        };
        match fit_with(&example(), &opts) {
            Err(FitError::FitDidNotConverge { iterations, .. }) => assert_eq!(iterations, 1),
            other => panic!("expected FitDidNotConverge, got {other:?}"),
        }
    }

    #[test]
    fn data_driven_guess() {
        let guess = initial_guess(&example(), InitialGuess::DataDriven).unwrap();
        assert_eq!(guess.vmax, 1.78);
        assert_eq!(guess.km, 3.0);

        let flat_zero = ObservationSet::from_pairs([(0.0, -1.0), (0.0, -2.0)]);
        let guess = initial_guess(&flat_zero, InitialGuess::DataDriven).unwrap();
        assert_eq!(guess, KineticParams::new(1.0, 1.0));
    }

    #[test]
    fn fixed_guess_is_projected() {
        let guess = initial_guess(&example(), InitialGuess::Fixed { vmax: -3.0, km: 4.0 }).unwrap();
        assert_eq!(guess, KineticParams::new(0.0, 4.0));
        assert!(initial_guess(&example(), InitialGuess::Fixed { vmax: f64::NAN, km: 1.0 }).is_err());
    }

    #[test]
    fn fixed_guess_reaches_same_optimum() {
        let default = fit(&example()).unwrap();
        let opts = FitOptions {
            initial_guess: InitialGuess::Fixed { vmax: 1.0, km: 1.0 },
            ..FitOptions::default()
        };
        let other = fit_with(&example(), &opts).unwrap().params;
        assert!((default.vmax - other.vmax).abs() < 1e-5);
        assert!((default.km - other.km).abs() < 1e-5);
    }
}
