//! Formatted terminal output.
//!
//! Formatting lives here so the fitting code stays free of presentation and
//! output changes stay local.

use crate::domain::{FitResult, ObservationSet};

use super::{point_rows, worst_point};

/// Parameters and R² are shown with this many decimals everywhere.
pub const DISPLAY_DECIMALS: usize = 5;

/// Run summary: dataset ranges, parameters, R² and solver diagnostics.
pub fn format_summary(observations: &ObservationSet, result: &FitResult) -> String {
    let d = DISPLAY_DECIMALS;
    let mut out = String::new();

    out.push_str("=== mm - Michaelis-Menten fit ===\n");
    if let Some(stats) = observations.stats() {
        out.push_str(&format!(
            "Points: n={} | S=[{:.3}, {:.3}] | v=[{:.3}, {:.3}]\n",
            stats.n_points,
            stats.substrate_min,
            stats.substrate_max,
            stats.velocity_min,
            stats.velocity_max
        ));
    }

    out.push('\n');
    out.push_str(&format!("Vmax = {:.d$}\n", result.params.vmax));
    out.push_str(&format!("Km   = {:.d$}\n", result.params.km));
    out.push_str(&format!("R²   = {:.d$}\n", result.r_squared));
    out.push('\n');
    out.push_str(&format!(
        "SSE={:.6e} RMSE={:.6} | {} solver step(s)\n",
        result.sse, result.rmse, result.iterations
    ));
    out
}

/// Per-observation table, with the worst-fitting point flagged.
pub fn format_points(observations: &ObservationSet, result: &FitResult) -> String {
    let rows = point_rows(observations, result);
    let worst = worst_point(&rows);

    let mut out = String::new();
    out.push_str(&format!(
        "  {:>12} {:>12} {:>12} {:>12}\n",
        "substrate", "v_obs", "v_fit", "residual"
    ));
    out.push_str(&format!("  {:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", ""));
    for (i, r) in rows.iter().enumerate() {
        let mark = if Some(i) == worst { '*' } else { ' ' };
        out.push_str(&format!(
            "{mark} {:>12.5} {:>12.5} {:>12.5} {:>12.5}\n",
            r.substrate, r.observed, r.fitted, r.residual
        ));
    }
    if worst.is_some() {
        out.push_str("(* largest absolute residual)\n");
    }
    out
}
