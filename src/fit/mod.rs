//! Curve fitting.
//!
//! Responsibilities:
//!
//! - validate an observation set before fitting
//! - choose the optimizer's starting point
//! - run the bounded Levenberg–Marquardt solve for `(Vmax, Km)`

pub mod fitter;

pub use fitter::*;
