//! Read/write saved fits (JSON).
//!
//! A result file is the portable representation of one analysis:
//! - fitted parameters and goodness of fit
//! - the observations that were fitted
//! - the dense overlay grid for quick re-plotting
//!
//! The schema is defined by `domain::ResultFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveGrid, FitResult, ObservationSet, ResultFile};
use crate::error::AppError;

/// Assemble the on-disk representation of a fit.
pub fn build_result_file(observations: &ObservationSet, result: &FitResult) -> ResultFile {
    ResultFile {
        tool: "mm".to_string(),
        generated_at: Utc::now(),
        params: result.params,
        r_squared: result.r_squared,
        sse: result.sse,
        rmse: result.rmse,
        iterations: result.iterations,
        observations: observations.points().to_vec(),
        grid: CurveGrid {
            substrate: result.grid_substrate.clone(),
            velocity: result.grid_predicted.clone(),
        },
    }
}

/// Write a result JSON file.
pub fn write_result_json(
    path: &Path,
    observations: &ObservationSet,
    result: &FitResult,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, &build_result_file(observations, result))
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;

    Ok(())
}

/// Read a result JSON file.
pub fn read_result_json(path: &Path) -> Result<ResultFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open result JSON '{}': {e}", path.display()))
    })?;
    let saved: ResultFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid result JSON: {e}")))?;
    Ok(saved)
}
