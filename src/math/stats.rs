//! Summary statistics and goodness of fit.

use crate::error::FitError;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of a slice (average of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// `Σ (observed - predicted)²`.
pub fn sum_squared_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| (o - p) * (o - p))
        .sum()
}

/// Coefficient of determination `R² = 1 - SS_res / SS_tot`.
///
/// `SS_tot == 0` (every observation equal) has no meaningful R² and is
/// reported as `DegenerateData` instead of producing ±∞ or NaN. The result can
/// be negative when the model does worse than the mean.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Result<f64, FitError> {
    if observed.len() != predicted.len() {
        return Err(FitError::invalid_input(format!(
            "R² needs equal-length inputs (observed={}, predicted={})",
            observed.len(),
            predicted.len()
        )));
    }
    let Some(avg) = mean(observed) else {
        return Err(FitError::invalid_input("R² needs at least one observation"));
    };

    let ss_tot: f64 = observed.iter().map(|o| (o - avg) * (o - avg)).sum();
    if ss_tot == 0.0 {
        return Err(FitError::degenerate(
            "all observed velocities are identical (total sum of squares is zero)",
        ));
    }

    let ss_res = sum_squared_residuals(observed, predicted);
    let r2 = 1.0 - ss_res / ss_tot;
    if !r2.is_finite() {
        return Err(FitError::invalid_input("R² is not finite (non-finite inputs)"));
    }
    Ok(r2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn perfect_prediction_is_one() {
        let obs = [1.0, 2.0, 4.0];
        assert_eq!(r_squared(&obs, &obs).unwrap(), 1.0);
    }

    #[test]
    fn mean_prediction_is_zero() {
        let obs = [1.0, 2.0, 3.0];
        let pred = [2.0, 2.0, 2.0];
        assert!(r_squared(&obs, &pred).unwrap().abs() < 1e-15);
    }

    #[test]
    fn worse_than_mean_is_negative() {
        let obs = [1.0, 2.0, 3.0];
        let pred = [3.0, 2.0, 1.0];
        assert!((r_squared(&obs, &pred).unwrap() - (-3.0)).abs() < 1e-12);
    }

    #[test]
    fn constant_observations_are_degenerate() {
        let obs = [5.0; 10];
        let pred = [4.0; 10];
        assert!(matches!(r_squared(&obs, &pred), Err(FitError::DegenerateData(_))));
    }

    #[test]
    fn length_mismatch_is_invalid() {
        assert!(matches!(
            r_squared(&[1.0, 2.0], &[1.0]),
            Err(FitError::InvalidInput(_))
        ));
        assert!(matches!(r_squared(&[], &[]), Err(FitError::InvalidInput(_))));
    }
}
