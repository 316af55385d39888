//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations and the observation set the fitter consumes
//! - fitted parameters and the packaged analysis result (`FitResult`)
//! - run configuration (`AnalysisConfig`, `InitialGuess`)
//! - the saved result file schema (`ResultFile`)

pub mod types;

pub use types::*;
