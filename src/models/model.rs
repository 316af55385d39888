//! Model evaluation for the Michaelis–Menten rate law.
//!
//! ```text
//! v(S) = Vmax · S / (Km + S)
//! ```
//!
//! The fitter relies on two primitive operations:
//! - predict `v(S)` for given parameters (residuals, grid, plots)
//! - the partial derivatives with respect to `(Vmax, Km)` (Jacobian rows)
//!
//! When `Km + S == 0` (only possible at `S = Km = 0` inside the bounds) the
//! expression is `0/0`. We define the rate as `0.0` there: no substrate, no
//! velocity. This keeps `rate(0, Vmax, Km) == 0` for every `Km ≥ 0`.

use crate::domain::KineticParams;

/// Velocity at substrate concentration `s`.
pub fn rate(s: f64, vmax: f64, km: f64) -> f64 {
    let denom = km + s;
    if denom == 0.0 {
        return 0.0;
    }
    vmax * s / denom
}

/// Elementwise [`rate`] over a sequence; output has the same length and order.
pub fn rate_many(substrates: &[f64], vmax: f64, km: f64) -> Vec<f64> {
    substrates.iter().map(|&s| rate(s, vmax, km)).collect()
}

/// [`rate_many`] for a parameter pair.
pub fn predict(params: KineticParams, substrates: &[f64]) -> Vec<f64> {
    rate_many(substrates, params.vmax, params.km)
}

/// Partial derivatives `[∂v/∂Vmax, ∂v/∂Km]` at `s`.
///
/// Follows the same zero-denominator policy as [`rate`].
pub fn rate_gradient(s: f64, vmax: f64, km: f64) -> [f64; 2] {
    let denom = km + s;
    if denom == 0.0 {
        return [0.0, 0.0];
    }
    [s / denom, -vmax * s / (denom * denom)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_saturation_at_km() {
        let v = rate(2.5, 4.0, 2.5);
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_substrate_gives_zero_rate() {
        for &km in &[1e-9, 0.5, 3.0, 1e6] {
            assert_eq!(rate(0.0, 7.0, km), 0.0);
        }
    }

    #[test]
    fn zero_substrate_and_zero_km_is_zero() {
        assert_eq!(rate(0.0, 7.0, 0.0), 0.0);
        assert_eq!(rate_gradient(0.0, 7.0, 0.0), [0.0, 0.0]);
    }

    #[test]
    fn zero_km_saturates_immediately() {
        assert!((rate(1e-6, 3.0, 0.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn monotone_and_bounded_by_vmax() {
        for &(vmax, km) in &[(1.0, 0.1), (2.0, 2.0), (50.0, 300.0), (0.0, 1.0)] {
            let mut prev = rate(0.0, vmax, km);
            let mut s = 1e-3;
            while s < 1e6 {
                let v = rate(s, vmax, km);
                assert!(v >= prev, "not monotone at s={s} (vmax={vmax}, km={km})");
                if vmax > 0.0 {
                    assert!(v < vmax, "rate reached vmax at s={s}");
                }
                prev = v;
                s *= 1.7;
            }
            assert!((rate(1e12, vmax, km) - vmax).abs() <= 1e-6 * vmax.max(1.0));
        }
    }

    #[test]
    fn rate_many_is_elementwise() {
        let s = [0.0, 1.0, 2.0, 4.0];
        let v = rate_many(&s, 2.0, 2.0);
        assert_eq!(v.len(), s.len());
        for (si, vi) in s.iter().zip(v.iter()) {
            assert_eq!(*vi, rate(*si, 2.0, 2.0));
        }
        assert!(rate_many(&[], 1.0, 1.0).is_empty());
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let (s, vmax, km) = (3.0, 2.0, 1.5);
        let h = 1e-6;
        let [dv, dk] = rate_gradient(s, vmax, km);
        let fd_v = (rate(s, vmax + h, km) - rate(s, vmax - h, km)) / (2.0 * h);
        let fd_k = (rate(s, vmax, km + h) - rate(s, vmax, km - h)) / (2.0 * h);
        assert!((dv - fd_v).abs() < 1e-8);
        assert!((dk - fd_k).abs() < 1e-8);
    }
}
