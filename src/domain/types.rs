//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fit::FitOptions;

/// Number of free parameters in the Michaelis–Menten model (`Vmax`, `Km`).
pub const PARAM_COUNT: usize = 2;

/// Default number of samples on the dense overlay grid.
pub const DEFAULT_GRID_POINTS: usize = 100;

/// Default grid span as a multiple of the largest observed substrate value.
pub const DEFAULT_GRID_EXTENT: f64 = 1.1;

/// One `(substrate, velocity)` measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub substrate: f64,
    pub velocity: f64,
}

/// An ordered set of observations.
///
/// Construction does not validate; the fitter decides what it can work with
/// and reports a typed `FitError` otherwise. Duplicate substrate values are
/// allowed and weigh equally in the least-squares sum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    points: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(points: Vec<Observation>) -> Self {
        Self { points }
    }

    /// Build a set from `(substrate, velocity)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(substrate, velocity)| Observation { substrate, velocity })
                .collect(),
        }
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn substrates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.substrate).collect()
    }

    pub fn velocities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.velocity).collect()
    }

    /// Summary ranges, or `None` for an empty set or non-finite values.
    pub fn stats(&self) -> Option<DatasetStats> {
        let mut s_min = f64::INFINITY;
        let mut s_max = f64::NEG_INFINITY;
        let mut v_min = f64::INFINITY;
        let mut v_max = f64::NEG_INFINITY;

        for p in &self.points {
            s_min = s_min.min(p.substrate);
            s_max = s_max.max(p.substrate);
            v_min = v_min.min(p.velocity);
            v_max = v_max.max(p.velocity);
        }

        if !(s_min.is_finite() && s_max.is_finite() && v_min.is_finite() && v_max.is_finite()) {
            return None;
        }

        Some(DatasetStats {
            n_points: self.points.len(),
            substrate_min: s_min,
            substrate_max: s_max,
            velocity_min: v_min,
            velocity_max: v_max,
        })
    }
}

/// Summary stats about an observation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub substrate_min: f64,
    pub substrate_max: f64,
    pub velocity_min: f64,
    pub velocity_max: f64,
}

/// One row of the manual-entry table, as raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualRow {
    pub substrate: String,
    pub velocity: String,
}

impl ManualRow {
    pub fn new(substrate: impl Into<String>, velocity: impl Into<String>) -> Self {
        Self {
            substrate: substrate.into(),
            velocity: velocity.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.substrate.trim().is_empty() && self.velocity.trim().is_empty()
    }
}

/// Michaelis–Menten parameters. Both are constrained to `[0, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticParams {
    /// Asymptotic maximum velocity.
    pub vmax: f64,
    /// Half-saturation constant.
    pub km: f64,
}

impl KineticParams {
    pub fn new(vmax: f64, km: f64) -> Self {
        Self { vmax, km }
    }

    pub fn to_vec(self) -> Vec<f64> {
        vec![self.vmax, self.km]
    }

    /// Inverse of [`KineticParams::to_vec`]. Extra entries are ignored.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [vmax, km, ..] => Some(Self::new(*vmax, *km)),
            _ => None,
        }
    }
}

/// Starting point handed to the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InitialGuess {
    /// `Vmax₀ = max(velocity)`, `Km₀ = median(substrate)`, each falling back
    /// to `1.0` when not strictly positive.
    #[default]
    DataDriven,
    /// Explicit starting values (projected onto the bounds).
    Fixed { vmax: f64, km: f64 },
}

/// Configuration for one `run_analysis` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Number of samples on the overlay grid (inclusive of both ends).
    pub grid_points: usize,
    /// Grid upper bound as a multiple of `max(substrate)`.
    pub grid_extent: f64,
    /// Optimizer settings.
    pub fit: FitOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid_points: DEFAULT_GRID_POINTS,
            grid_extent: DEFAULT_GRID_EXTENT,
            fit: FitOptions::default(),
        }
    }
}

/// Output of a full analysis.
///
/// Every derived vector is evaluated with the single `params` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub params: KineticParams,
    pub r_squared: f64,
    /// Model prediction at each observed substrate value (input order).
    pub predicted: Vec<f64>,
    /// `observed - predicted` at each observation.
    pub residuals: Vec<f64>,
    pub grid_substrate: Vec<f64>,
    pub grid_predicted: Vec<f64>,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
}

/// A saved fit (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub params: KineticParams,
    pub r_squared: f64,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
    pub observations: Vec<Observation>,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub substrate: Vec<f64>,
    pub velocity: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_cover_both_axes() {
        let set = ObservationSet::from_pairs([(0.5, 0.4), (8.0, 1.6), (2.0, 1.0)]);
        let stats = set.stats().unwrap();
        assert_eq!(stats.n_points, 3);
        assert_eq!(stats.substrate_min, 0.5);
        assert_eq!(stats.substrate_max, 8.0);
        assert_eq!(stats.velocity_min, 0.4);
        assert_eq!(stats.velocity_max, 1.6);
    }

    #[test]
    fn stats_none_for_empty_set() {
        assert!(ObservationSet::default().stats().is_none());
    }

    #[test]
    fn params_slice_conversion() {
        let p = KineticParams::from_slice(&[2.0, 3.0]).unwrap();
        assert_eq!(p, KineticParams::new(2.0, 3.0));
        assert!(KineticParams::from_slice(&[1.0]).is_none());
        assert_eq!(p.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn blank_manual_row() {
        assert!(ManualRow::new(" ", "").is_blank());
        assert!(!ManualRow::new("1", "").is_blank());
    }
}
