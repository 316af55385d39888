//! Plotters-powered kinetics chart widget for Ratatui.
//!
//! Plotters gives axis descriptions, tick labels and a series legend with
//! little manual layout work. Output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Render-only chart description; series and bounds are computed by the caller.
pub struct KineticsChart<'a> {
    /// Dense fitted curve.
    pub curve: &'a [(f64, f64)],
    /// Observed `(substrate, velocity)` pairs.
    pub points: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl Widget for KineticsChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are coarse; keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.2}"))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let curve_color = RGBColor(0, 255, 255);
            let points_color = RGBColor(255, 255, 0);

            chart
                .draw_series(LineSeries::new(self.curve.iter().copied(), &curve_color))?
                .label("Michaelis-Menten fit")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 6, y)], curve_color));

            // `Pixel` rather than `Circle`: the backend scales circle radii
            // far too large in terminal cells.
            chart
                .draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), points_color)))?
                .label("observed data")
                .legend(move |(x, y)| Pixel::new((x + 3, y), points_color));

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(&BLACK)
                .border_style(&WHITE)
                .label_font(("sans-serif", 10).into_font().color(&WHITE))
                .draw()?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
