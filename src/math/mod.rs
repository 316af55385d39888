//! Numerical utilities: least-squares solves, the bounded Levenberg–Marquardt
//! optimizer, and summary statistics.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use stats::*;
