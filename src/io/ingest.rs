//! Observation ingest: CSV files and the manual-entry table.
//!
//! This module is responsible for turning user-supplied tables into an
//! `ObservationSet` of `(substrate, velocity)` pairs.
//!
//! Design goals:
//! - **Column identity, not header format**: common header spellings are
//!   recognised; a bare two-column file is read positionally
//! - **Fail with context**: non-numeric cells and missing columns are
//!   `InvalidInput` naming the line or row
//! - **Separation of concerns**: no fitting logic here; shape checks
//!   (too few points, constant data) belong to the fitter

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{ManualRow, Observation, ObservationSet};
use crate::error::FitError;

/// Accepted (normalized) header names for the substrate column.
const SUBSTRATE_HEADERS: [&str; 8] = [
    "substrate",
    "s",
    "[s]",
    "sustrato",
    "substrate concentration",
    "substrate_concentration",
    "concentration",
    "conc",
];

/// Accepted (normalized) header names for the velocity column.
const VELOCITY_HEADERS: [&str; 8] = [
    "velocity",
    "v",
    "v0",
    "rate",
    "velocidad",
    "initial velocity",
    "initial_velocity",
    "reaction velocity",
];

/// Where the two columns live and whether the first record is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    substrate: usize,
    velocity: usize,
    has_header: bool,
}

impl ObservationSet {
    /// Load observations from a CSV file.
    pub fn from_file(path: &Path) -> Result<Self, FitError> {
        let file = File::open(path).map_err(|e| {
            FitError::invalid_input(format!("failed to open CSV '{}': {e}", path.display()))
        })?;
        let set = Self::from_reader(file)?;
        log::info!("loaded {} observation(s) from {}", set.len(), path.display());
        Ok(set)
    }

    /// Load observations from any CSV stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FitError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in reader.records() {
            let record =
                result.map_err(|e| FitError::invalid_input(format!("CSV parse error: {e}")))?;
            records.push(record);
        }

        let Some(first) = records.first() else {
            return Ok(ObservationSet::default());
        };
        let layout = resolve_layout(first)?;

        let body = if layout.has_header { &records[1..] } else { &records[..] };
        let mut points = Vec::with_capacity(body.len());
        for record in body {
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            let substrate = cell(record, layout.substrate);
            let velocity = cell(record, layout.velocity);
            if substrate.is_empty() && velocity.is_empty() {
                continue;
            }
            points.push(Observation {
                substrate: parse_value(substrate, "substrate", || format!("line {line}"))?,
                velocity: parse_value(velocity, "velocity", || format!("line {line}"))?,
            });
        }

        Ok(ObservationSet::new(points))
    }

    /// Build observations from the manual-entry table.
    ///
    /// Rows with both cells blank are skipped (the table starts with empty
    /// rows); anything else must parse as two numbers.
    pub fn from_manual_table(rows: &[ManualRow]) -> Result<Self, FitError> {
        let mut points = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let at = || format!("row {}", idx + 1);
            points.push(Observation {
                substrate: parse_value(row.substrate.trim(), "substrate", at)?,
                velocity: parse_value(row.velocity.trim(), "velocity", at)?,
            });
        }
        Ok(ObservationSet::new(points))
    }
}

fn resolve_layout(first: &StringRecord) -> Result<ColumnLayout, FitError> {
    let names: Vec<String> = first.iter().map(normalize_header_name).collect();
    let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));

    match (find(&SUBSTRATE_HEADERS), find(&VELOCITY_HEADERS)) {
        (Some(substrate), Some(velocity)) if substrate != velocity => {
            return Ok(ColumnLayout {
                substrate,
                velocity,
                has_header: true,
            });
        }
        (Some(_), None) => {
            return Err(FitError::invalid_input(
                "missing velocity column (expected a header such as `velocity`)",
            ));
        }
        (None, Some(_)) => {
            return Err(FitError::invalid_input(
                "missing substrate column (expected a header such as `substrate`)",
            ));
        }
        _ => {}
    }

    // No recognised headers: fall back to a positional two-column table.
    if first.len() != 2 {
        return Err(FitError::invalid_input(format!(
            "expected two columns (substrate, velocity) but found {}; \
             name them `substrate` and `velocity` to select them from a wider table",
            first.len()
        )));
    }
    // A row is a header only when none of its cells is a number; a partly
    // numeric first row is data and goes through the usual cell checks.
    let has_header = first.iter().all(|c| c.trim().parse::<f64>().is_err());
    Ok(ColumnLayout {
        substrate: 0,
        velocity: 1,
        has_header,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

fn parse_value(raw: &str, column: &str, at: impl Fn() -> String) -> Result<f64, FitError> {
    if raw.is_empty() {
        return Err(FitError::invalid_input(format!(
            "{}: missing {column} value",
            at()
        )));
    }
    let value = raw.parse::<f64>().map_err(|_| {
        FitError::invalid_input(format!("{}: {column} value '{raw}' is not a number", at()))
    })?;
    if !value.is_finite() {
        return Err(FitError::invalid_input(format!(
            "{}: {column} value '{raw}' is not finite",
            at()
        )));
    }
    Ok(value)
}
