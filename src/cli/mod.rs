//! Command-line parsing for the Michaelis-Menten fitter.
//!
//! Argument parsing and command dispatch live apart from the fitting code; the
//! handlers in [`crate::app`] turn these structs into [`AnalysisConfig`]s.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AnalysisConfig, DEFAULT_GRID_EXTENT, DEFAULT_GRID_POINTS, InitialGuess};
use crate::fit::FitOptions;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mm",
    version,
    about = "Michaelis-Menten enzyme kinetics fitter (Vmax, Km, R²)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a CSV of (substrate, velocity) pairs and print the parameters, R² and a plot.
    Fit(FitArgs),
    /// Generate a synthetic Michaelis-Menten dataset as CSV.
    Simulate(SimulateArgs),
    /// Plot a previously exported result JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI (manual table or CSV file input).
    Tui(TuiArgs),
}

/// Solver and grid settings shared by `fit` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Starting Vmax for the solver (requires --km0; default: max observed velocity).
    #[arg(long, requires = "km0")]
    pub vmax0: Option<f64>,

    /// Starting Km for the solver (requires --vmax0; default: median substrate).
    #[arg(long, requires = "vmax0")]
    pub km0: Option<f64>,

    /// Maximum accepted solver steps.
    #[arg(long, env = "MM_MAX_ITERATIONS", default_value_t = 200)]
    pub max_iterations: usize,

    /// Number of points on the fitted-curve grid.
    #[arg(long, env = "MM_GRID_POINTS", default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,

    /// Grid upper bound as a multiple of the largest substrate value.
    #[arg(long, default_value_t = DEFAULT_GRID_EXTENT)]
    pub grid_extent: f64,
}

impl AnalysisArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        let initial_guess = match (self.vmax0, self.km0) {
            (Some(vmax), Some(km)) => InitialGuess::Fixed { vmax, km },
            _ => InitialGuess::DataDriven,
        };
        AnalysisConfig {
            grid_points: self.grid_points,
            grid_extent: self.grid_extent,
            fit: FitOptions {
                initial_guess,
                max_iterations: self.max_iterations,
                ..FitOptions::default()
            },
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// CSV file with substrate and velocity columns (omit to pick interactively).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Skip the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 22)]
    pub height: usize,

    /// Export per-observation results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export parameters, observations and the fitted grid to JSON.
    #[arg(long = "export-result", value_name = "JSON")]
    pub export_result: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// True maximum velocity.
    #[arg(long)]
    pub vmax: f64,

    /// True Michaelis constant.
    #[arg(long)]
    pub km: f64,

    /// Standard deviation of additive Gaussian noise on velocity.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed (same seed, same dataset).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of observations.
    #[arg(short = 'n', long, default_value_t = 12)]
    pub points: usize,

    /// Largest substrate concentration (default: 10 × Km).
    #[arg(long)]
    pub s_max: Option<f64>,

    /// Output file (default: stdout).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

/// Options for plotting a saved result.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Result JSON produced by `mm fit --export-result`.
    #[arg(long, value_name = "JSON")]
    pub result: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 22)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Start in CSV mode with this file preloaded.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}
