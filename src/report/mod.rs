//! Reporting utilities: per-point residual rows and formatted terminal output.

use crate::domain::{FitResult, ObservationSet};

mod format;

pub use format::{DISPLAY_DECIMALS, format_points, format_summary};

/// One observation alongside its fitted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRow {
    pub substrate: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

/// Pair every observation with the prediction and residual from `result`.
///
/// `result` must come from a run over `observations`; rows stop at the shorter
/// of the two if they disagree.
pub fn point_rows(observations: &ObservationSet, result: &FitResult) -> Vec<PointRow> {
    observations
        .points()
        .iter()
        .zip(result.predicted.iter().zip(result.residuals.iter()))
        .map(|(p, (&fitted, &residual))| PointRow {
            substrate: p.substrate,
            observed: p.velocity,
            fitted,
            residual,
        })
        .collect()
}

/// Index of the row with the largest absolute residual.
pub fn worst_point(rows: &[PointRow]) -> Option<usize> {
    rows.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.residual.abs().total_cmp(&b.residual.abs()))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_analysis;

    #[test]
    fn rows_follow_observation_order() {
        let obs = ObservationSet::from_pairs([(4.0, 1.33), (0.5, 0.42), (16.0, 1.78), (1.0, 0.7)]);
        let result = run_analysis(&obs).unwrap();
        let rows = point_rows(&obs, &result);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].substrate, 4.0);
        assert_eq!(rows[1].observed, 0.42);
        for r in &rows {
            assert!((r.observed - r.fitted - r.residual).abs() < 1e-15);
        }
    }

    #[test]
    fn worst_point_uses_absolute_residual() {
        let row = |residual| PointRow {
            substrate: 1.0,
            observed: 1.0,
            fitted: 1.0 - residual,
            residual,
        };
        assert_eq!(worst_point(&[row(0.1), row(-0.5), row(0.3)]), Some(1));
        assert_eq!(worst_point(&[]), None);
    }
}
