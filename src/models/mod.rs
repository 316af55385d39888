//! Michaelis–Menten rate law.
//!
//! The model is implemented as small, pure functions so that fitting, reporting
//! and plotting code can share one definition.

pub mod model;

pub use model::*;
