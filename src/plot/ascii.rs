//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, so output is deterministic and can be checked
//! with golden tests.
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line

use crate::domain::{FitResult, ObservationSet, ResultFile};

pub const Y_LABEL: &str = "reaction velocity";
pub const X_LABEL: &str = "substrate concentration";
const LEGEND: &str = "legend: o = data   - = fit";

/// Plot an in-memory analysis: observations plus the dense fitted grid.
pub fn render_fit_plot(
    observations: &ObservationSet,
    result: &FitResult,
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = observations
        .points()
        .iter()
        .map(|p| (p.substrate, p.velocity))
        .collect();
    let curve = zip_xy(&result.grid_substrate, &result.grid_predicted);
    render_ascii_plot(&points, &curve, width, height)
}

/// Plot a saved result file.
pub fn render_result_file_plot(saved: &ResultFile, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = saved
        .observations
        .iter()
        .map(|p| (p.substrate, p.velocity))
        .collect();
    let curve = zip_xy(&saved.grid.substrate, &saved.grid.velocity);
    render_ascii_plot(&points, &curve, width, height)
}

/// Overlay `points` on the polyline `curve`.
pub fn render_ascii_plot(
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = || points.iter().chain(curve.iter());
    let (x_min, x_max) = span(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = span(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
        match prev {
            Some(from) => draw_line(&mut grid, from, cell, '-'),
            None => grid[cell.1][cell.0] = '-',
        }
        prev = Some(cell);
    }

    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{Y_LABEL}: [{y_min:.3}, {y_max:.3}]\n"));
    for row in grid {
        out.push('|');
        out.extend(row);
        out.push('\n');
    }
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push('\n');
    out.push_str(&format!("{X_LABEL}: [{x_min:.3}, {x_max:.3}]\n"));
    out.push_str(LEGEND);
    out.push('\n');
    out
}

fn zip_xy(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().copied().zip(ys.iter().copied()).collect()
}

/// Finite min/max of `values`; a single value gets a unit-wide span.
fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    if hi > lo { Some((lo, hi)) } else { Some((lo, lo + 1.0)) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

/// Bresenham line between two cells; never overwrites a non-blank cell.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x, mut y) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let points = [(9.0, 0.0)];
        let curve = [(0.0, 0.0), (9.0, 9.0)];

        let txt = render_ascii_plot(&points, &curve, 10, 5);
        let expected = concat!(
            "reaction velocity: [-0.450, 9.450]\n",
            "|        --\n",
            "|      --  \n",
            "|    --    \n",
            "|  --      \n",
            "|--       o\n",
            "+----------\n",
            "substrate concentration: [0.000, 9.000]\n",
            "legend: o = data   - = fit\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn fit_plot_is_deterministic_and_labeled() {
        let obs = ObservationSet::from_pairs([(0.5, 0.42), (1.0, 0.7), (2.0, 1.0), (4.0, 1.33), (8.0, 1.6)]);
        let result = crate::app::pipeline::run_analysis(&obs).unwrap();
        let a = render_fit_plot(&obs, &result, 60, 15);
        let b = render_fit_plot(&obs, &result, 60, 15);
        assert_eq!(a, b);
        assert!(a.starts_with(Y_LABEL));
        assert!(a.contains(X_LABEL));
        assert!(a.contains("legend"));
        let plotted: usize = a
            .lines()
            .filter(|l| l.starts_with('|'))
            .map(|l| l.matches('o').count())
            .sum();
        assert_eq!(plotted, 5);
    }

    #[test]
    fn empty_input_still_renders_frame() {
        let txt = render_ascii_plot(&[], &[], 10, 5);
        assert_eq!(txt.lines().count(), 1 + 5 + 1 + 2);
    }
}
