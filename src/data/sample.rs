//! Synthetic Michaelis-Menten datasets.
//!
//! `mm simulate` writes these as CSV so the fitter can be exercised against
//! known parameters. Generation is fully determined by the seed.

use std::io::Write;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{KineticParams, ObservationSet};
use crate::error::FitError;
use crate::models::rate;

/// Substrate range default when no explicit maximum is given: `10 · Km`.
const DEFAULT_SPAN_IN_KM: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub params: KineticParams,
    /// Standard deviation of additive Gaussian noise on velocity.
    pub noise: f64,
    pub points: usize,
    pub s_max: Option<f64>,
    pub seed: u64,
}

impl SampleSpec {
    fn substrate_max(&self) -> f64 {
        self.s_max.unwrap_or(DEFAULT_SPAN_IN_KM * self.params.km)
    }
}

/// Draw `points` observations with substrate evenly spaced over `(0, s_max]`.
pub fn generate_sample(spec: &SampleSpec) -> Result<ObservationSet, FitError> {
    let KineticParams { vmax, km } = spec.params;
    if !(vmax.is_finite() && vmax > 0.0) {
        return Err(FitError::invalid_input(format!("Vmax must be finite and > 0 (got {vmax})")));
    }
    if !(km.is_finite() && km > 0.0) {
        return Err(FitError::invalid_input(format!("Km must be finite and > 0 (got {km})")));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(FitError::invalid_input(format!(
            "noise must be finite and >= 0 (got {})",
            spec.noise
        )));
    }
    if spec.points == 0 {
        return Err(FitError::invalid_input("point count must be > 0"));
    }
    let s_max = spec.substrate_max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return Err(FitError::invalid_input(format!("s-max must be finite and > 0 (got {s_max})")));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise)
        .map_err(|e| FitError::invalid_input(format!("noise distribution: {e}")))?;

    let step = s_max / spec.points as f64;
    let pairs = (1..=spec.points).map(|i| {
        let s = step * i as f64;
        let v = rate(s, vmax, km);
        let noisy = if spec.noise > 0.0 { v + normal.sample(&mut rng) } else { v };
        (s, noisy)
    });
    let sample = ObservationSet::from_pairs(pairs.collect::<Vec<_>>());

    log::debug!(
        "generated {} point(s) for vmax={vmax} km={km} noise={} seed={}",
        sample.len(),
        spec.noise,
        spec.seed
    );
    Ok(sample)
}

/// Write observations as a two-column `substrate,velocity` CSV.
pub fn write_observations_csv<W: Write>(writer: W, observations: &ObservationSet) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["substrate", "velocity"])?;
    for p in observations.points() {
        w.serialize((p.substrate, p.velocity))?;
    }
    w.flush()?;
    Ok(())
}
