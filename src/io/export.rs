//! Export per-point results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use crate::domain::{FitResult, ObservationSet};
use crate::error::AppError;

/// Write `substrate, observed, predicted, residual` rows to a CSV file.
pub fn write_results_csv(
    path: &Path,
    observations: &ObservationSet,
    result: &FitResult,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(file);
    write_rows(&mut writer, observations, result)?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    observations: &ObservationSet,
    result: &FitResult,
) -> Result<(), AppError> {
    writer
        .write_record(["substrate", "velocity_obs", "velocity_fit", "residual"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for ((p, fit), residual) in observations
        .points()
        .iter()
        .zip(result.predicted.iter())
        .zip(result.residuals.iter())
    {
        writer
            .write_record([
                format!("{}", p.substrate),
                format!("{}", p.velocity),
                format!("{fit:.10}"),
                format!("{residual:.10}"),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}
