//! Bounded Levenberg–Marquardt for small nonlinear least-squares problems.
//!
//! We minimize `Σ r_i(x)²` where the residual vector `r` and its Jacobian `J`
//! are supplied by a [`LeastSquaresProblem`]. Each iteration solves the damped
//! linear problem
//!
//! ```text
//! minimize ‖J δ + r‖² + λ ‖D δ‖²
//! ```
//!
//! with `D = diag(‖J_k‖)` (Marquardt scaling), as the stacked system
//! `[J; √λ D] δ = [-r; 0]` via [`solve_least_squares`].
//!
//! Bounds are handled by projection: every trial point goes through
//! [`LeastSquaresProblem::project`]. The gradient stopping test uses the
//! projected gradient `x - P(x - D⁻²∇)`, which vanishes at a minimum sitting on
//! a bound even though the raw gradient does not. Both the gradient and step
//! tests are measured in the scaled variables `D x`, so rescaling the data or
//! the parameters (molar instead of micromolar units, say) does not change
//! when the solver stops. Parameters pinned to a bound
//! with the gradient pointing outward are frozen for the step (their Jacobian
//! column is zeroed), so the free parameters still move toward the constrained
//! optimum instead of the whole step being clipped away.
//!
//! Everything is deterministic: the same problem and start point always give
//! the same iterates.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::math::solve_least_squares;

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;
/// Floor for Marquardt column scales so a zero Jacobian column still damps.
const SCALE_FLOOR: f64 = 1e-12;

/// Problem definition for nonlinear least squares.
pub trait LeastSquaresProblem {
    /// Residual dimension `m`.
    fn residual_dim(&self) -> usize;

    /// Parameter dimension `n`.
    fn param_dim(&self) -> usize;

    /// Fill residual vector `r(x)`, len = m.
    fn residuals(&self, params: &[f64], out: &mut [f64]);

    /// Fill the `m × n` Jacobian `∂r_i/∂x_k`.
    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>);

    /// Map a point onto the feasible set. Applied to the start point and to
    /// every trial step.
    fn project(&self, _params: &mut [f64]) {}
}

/// Stopping criteria and damping schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Maximum number of outer iterations (Jacobian evaluations).
    pub max_iterations: usize,
    /// Stop when an accepted step reduces the SSE by less than `ftol · SSE`.
    pub ftol: f64,
    /// Stop when a step is shorter than `xtol · ‖x‖`, both measured as `‖D x‖`.
    pub xtol: f64,
    /// Stop when the cosine between `r` and every free Jacobian column,
    /// `|J_kᵀr| / (‖J_k‖ ‖r‖)`, is at most `gtol`.
    pub gtol: f64,
    /// Starting damping factor λ.
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_damping: 1e-3,
        }
    }
}

/// Which criterion ended a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residuals are exactly zero.
    ExactFit,
    /// Scaled projected gradient below `gtol`.
    Gradient,
    /// Step below `xtol`.
    StepSize,
    /// Relative SSE reduction below `ftol`.
    CostReduction,
    /// No damping level produced a descent step.
    NoDescent,
}

impl Termination {
    pub fn label(self) -> &'static str {
        match self {
            Termination::ExactFit => "exact fit",
            Termination::Gradient => "gradient tolerance",
            Termination::StepSize => "step tolerance",
            Termination::CostReduction => "cost tolerance",
            Termination::NoDescent => "no further descent",
        }
    }
}

/// Result of a converged run.
#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    pub params: Vec<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    /// Number of accepted steps.
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmFailure {
    #[error("problem dimensions are inconsistent: {0}")]
    InvalidProblem(String),

    #[error("iteration limit of {iterations} reached (sse={sse:.6e})")]
    IterationLimit {
        iterations: usize,
        params: Vec<f64>,
        sse: f64,
    },

    #[error("non-finite residuals or Jacobian at iteration {iterations}")]
    NonFinite { iterations: usize },
}

/// Minimize `‖r(x)‖²` starting from `start`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    start: &[f64],
    opts: &LmOptions,
) -> Result<LmReport, LmFailure> {
    let m = problem.residual_dim();
    let n = problem.param_dim();
    if n == 0 || m == 0 || start.len() != n {
        return Err(LmFailure::InvalidProblem(format!(
            "m={m}, n={n}, start.len()={}",
            start.len()
        )));
    }

    let mut x = DVector::from_column_slice(start);
    problem.project(x.as_mut_slice());

    let mut r = DVector::<f64>::zeros(m);
    problem.residuals(x.as_slice(), r.as_mut_slice());
    let mut sse = r.norm_squared();
    if !sse.is_finite() {
        return Err(LmFailure::NonFinite { iterations: 0 });
    }

    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut lambda = opts.initial_damping.max(MIN_DAMPING);
    let mut accepted_steps = 0usize;

    for _ in 0..opts.max_iterations {
        if sse == 0.0 {
            return Ok(finish(x, sse, accepted_steps, Termination::ExactFit));
        }

        problem.jacobian(x.as_slice(), &mut jac);
        if jac.iter().any(|v| !v.is_finite()) {
            return Err(LmFailure::NonFinite {
                iterations: accepted_steps,
            });
        }

        let scale: Vec<f64> = (0..n)
            .map(|k| jac.column(k).norm().max(SCALE_FLOOR))
            .collect();

        // Gradient step in scaled variables, `x - D⁻² Jᵀr`.
        let grad = jac.tr_mul(&r);
        let shifted = DVector::from_fn(n, |k, _| x[k] - grad[k] / (scale[k] * scale[k]));
        let mut projected = shifted.clone();
        problem.project(projected.as_mut_slice());

        let r_norm = sse.sqrt();
        let cosine = (0..n)
            .map(|k| (x[k] - projected[k]).abs() * scale[k] / r_norm)
            .fold(0.0, f64::max);
        if cosine <= opts.gtol {
            return Ok(finish(x, sse, accepted_steps, Termination::Gradient));
        }

        // Active bound: the descent direction moves x_k but projection puts it back.
        let frozen: Vec<bool> = (0..n)
            .map(|k| shifted[k] != x[k] && projected[k] == x[k])
            .collect();
        let mut jac_free = jac.clone();
        for (k, _) in frozen.iter().enumerate().filter(|(_, f)| **f) {
            jac_free.column_mut(k).fill(0.0);
        }
        let x_norm = scaled_norm(x.iter().copied(), &scale);

        // Raise λ until the (projected) step lowers the SSE.
        let mut accepted = false;
        while lambda <= MAX_DAMPING {
            let Some(mut delta) = damped_step(&jac_free, &r, &scale, lambda) else {
                lambda *= 10.0;
                continue;
            };
            for (k, _) in frozen.iter().enumerate().filter(|(_, f)| **f) {
                delta[k] = 0.0;
            }

            let mut trial = &x + &delta;
            problem.project(trial.as_mut_slice());

            let step_norm = scaled_norm((&trial - &x).iter().copied(), &scale);
            if step_norm == 0.0 || step_norm <= opts.xtol * x_norm {
                return Ok(finish(x, sse, accepted_steps, Termination::StepSize));
            }

            let mut r_trial = DVector::<f64>::zeros(m);
            problem.residuals(trial.as_slice(), r_trial.as_mut_slice());
            let sse_trial = r_trial.norm_squared();

            if sse_trial.is_finite() && sse_trial < sse {
                let reduction = sse - sse_trial;
                let previous = sse;

                x = trial;
                r = r_trial;
                sse = sse_trial;
                accepted_steps += 1;
                lambda = (lambda / 10.0).max(MIN_DAMPING);

                if reduction <= opts.ftol * previous {
                    return Ok(finish(x, sse, accepted_steps, Termination::CostReduction));
                }
                accepted = true;
                break;
            }

            lambda *= 10.0;
        }

        if !accepted {
            return Ok(finish(x, sse, accepted_steps, Termination::NoDescent));
        }
    }

    Err(LmFailure::IterationLimit {
        iterations: opts.max_iterations,
        params: x.iter().copied().collect(),
        sse,
    })
}

fn finish(x: DVector<f64>, sse: f64, iterations: usize, termination: Termination) -> LmReport {
    LmReport {
        params: x.iter().copied().collect(),
        sse,
        iterations,
        termination,
    }
}

/// `‖D v‖` for the Marquardt column scales `D`.
fn scaled_norm(v: impl Iterator<Item = f64>, scale: &[f64]) -> f64 {
    v.zip(scale)
        .map(|(value, s)| (value * s).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let m = jac.nrows();
    let n = jac.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(m + n, n);
    let mut b = DVector::<f64>::zeros(m + n);

    a.view_mut((0, 0), (m, n)).copy_from(jac);
    for i in 0..m {
        b[i] = -r[i];
    }
    for k in 0..n {
        a[(m + k, k)] = sqrt_lambda * scale[k];
    }

    solve_least_squares(&a, &b)
}
