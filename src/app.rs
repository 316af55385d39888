//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - runs fits, simulations and plots
//! - writes optional exports

use std::fs::File;
use std::io;

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, SimulateArgs, TuiArgs};
use crate::data::{SampleSpec, generate_sample, write_observations_csv};
use crate::domain::{KineticParams, ObservationSet};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `mm` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may set MM_GRID_POINTS / MM_MAX_ITERATIONS / RUST_LOG; a missing file is fine.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Clap requires a subcommand name, so `mm` and `mm -f x.csv` are rewritten
    // to `mm tui ...` before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(path) => path.clone(),
        None => crate::cli::picker::prompt_for_csv_path()?,
    };
    let config = args.analysis.to_config();

    let observations = ObservationSet::from_file(&path)?;
    let result = pipeline::run_analysis_with(&observations, &config).inspect_err(|err| {
        log::warn!("fit of {} failed ({})", path.display(), err.kind_name());
    })?;

    println!("{}", crate::report::format_summary(&observations, &result));
    println!("{}", crate::report::format_points(&observations, &result));

    if !args.no_plot {
        let plot = crate::plot::render_fit_plot(&observations, &result, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        crate::io::write_results_csv(path, &observations, &result)?;
    }
    if let Some(path) = &args.export_result {
        crate::io::write_result_json(path, &observations, &result)?;
    }

    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = SampleSpec {
        params: KineticParams::new(args.vmax, args.km),
        noise: args.noise,
        points: args.points,
        s_max: args.s_max,
        seed: args.seed,
    };
    let sample = generate_sample(&spec)?;

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AppError::new(2, format!("Failed to create '{}': {e}", path.display()))
            })?;
            write_observations_csv(file, &sample)
        }
        None => write_observations_csv(io::stdout().lock(), &sample),
    };
    written.map_err(|e| AppError::new(2, format!("Failed to write sample CSV: {e}")))
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let saved = crate::io::read_result_json(&args.result)?;
    println!(
        "Vmax = {:.5} | Km = {:.5} | R² = {:.5}",
        saved.params.vmax, saved.params.km, saved.r_squared
    );
    println!(
        "{}",
        crate::plot::render_result_file_plot(&saved, args.width, args.height)
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

/// Rewrite argv so `mm` defaults to `mm tui`.
///
/// Rules:
/// - `mm`                      -> `mm tui`
/// - `mm -f data.csv ...`      -> `mm tui -f data.csv ...`
/// - `mm --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "fit" | "simulate" | "plot" | "tui") {
        return argv;
    }

    // A leading flag is treated as a TUI flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
