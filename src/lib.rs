//! `mm-kinetics` library crate.
//!
//! Fits the Michaelis-Menten model `v = Vmax·S / (Km + S)` to observed
//! `(substrate, velocity)` pairs and reports `Vmax`, `Km` and R².
//!
//! The binary (`mm`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI and the TUI share one analysis pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
