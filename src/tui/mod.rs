//! Ratatui-based terminal UI.
//!
//! Two input modes feed the same analysis pipeline:
//! - **Manual table**: editable rows of substrate/velocity cells
//! - **CSV file**: a path typed into the input panel
//!
//! `c` computes; the fitted parameters, R² and an overlay chart are shown on
//! success, the error message on failure. Either way the app stays usable.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::run_analysis_with;
use crate::cli::TuiArgs;
use crate::domain::{AnalysisConfig, FitResult, ManualRow, ObservationSet};
use crate::error::{AppError, FitError};
use crate::plot::{X_LABEL, Y_LABEL};
use crate::report::DISPLAY_DECIMALS;

mod plotters_chart;

use plotters_chart::KineticsChart;

/// Rows in a fresh manual table.
const DEFAULT_ROWS: usize = 10;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let mut app = App::new(args.analysis.to_config());
    if let Some(path) = &args.file {
        app.mode = InputMode::CsvFile;
        app.csv_path = path.display().to_string();
        app.compute();
    }

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Manual,
    CsvFile,
}

impl InputMode {
    fn title(self) -> &'static str {
        match self {
            InputMode::Manual => "Manual table",
            InputMode::CsvFile => "CSV file",
        }
    }

    fn toggled(self) -> Self {
        match self {
            InputMode::Manual => InputMode::CsvFile,
            InputMode::CsvFile => InputMode::Manual,
        }
    }
}

/// Which manual-table column the cursor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Substrate,
    Velocity,
}

/// Last successful analysis.
struct Computed {
    observations: ObservationSet,
    result: FitResult,
}

struct App {
    mode: InputMode,
    rows: Vec<ManualRow>,
    cursor_row: usize,
    cursor_col: Column,
    /// Text being typed into the focused cell or path; `None` when not editing.
    edit: Option<String>,
    csv_path: String,
    config: AnalysisConfig,
    status: String,
    computed: Option<Computed>,
}

impl App {
    fn new(config: AnalysisConfig) -> Self {
        Self {
            mode: InputMode::Manual,
            rows: vec![ManualRow::default(); DEFAULT_ROWS],
            cursor_row: 0,
            cursor_col: Column::Substrate,
            edit: None,
            csv_path: String::new(),
            config,
            status: "Enter data, then press c to compute.".to_string(),
            computed: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.edit.is_some() {
            self.handle_edit_key(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Char('m') => {
                self.mode = self.mode.toggled();
                self.status = format!("Input: {}", self.mode.title());
            }
            KeyCode::Char('c') => self.compute(),
            KeyCode::Enter => self.begin_edit(),
            _ if self.mode == InputMode::Manual => self.handle_table_key(code),
            _ => {}
        }
        false
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.cursor_row = self.cursor_row.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor_row + 1 < self.rows.len() {
                    self.cursor_row += 1;
                }
            }
            KeyCode::Left => self.cursor_col = Column::Substrate,
            KeyCode::Right => self.cursor_col = Column::Velocity,
            KeyCode::Char('a') => {
                self.rows.insert(self.cursor_row + 1, ManualRow::default());
                self.cursor_row += 1;
                self.status = format!("Added row ({} total).", self.rows.len());
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.rows.len() > 1 {
                    self.rows.remove(self.cursor_row);
                    self.cursor_row = self.cursor_row.min(self.rows.len() - 1);
                    self.status = format!("Removed row ({} left).", self.rows.len());
                } else {
                    self.rows[0] = ManualRow::default();
                    self.status = "Cleared the last row.".to_string();
                }
            }
            KeyCode::Backspace => *self.focused_cell_mut() = String::new(),
            _ => {}
        }
    }

    fn begin_edit(&mut self) {
        let current = match self.mode {
            InputMode::Manual => self.focused_cell_mut().clone(),
            InputMode::CsvFile => self.csv_path.clone(),
        };
        self.edit = Some(current);
        self.status = "Editing: Enter to keep, Esc to cancel.".to_string();
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(buffer) = self.edit.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.edit = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter | KeyCode::Tab => {
                let text = std::mem::take(buffer);
                self.edit = None;
                match self.mode {
                    InputMode::Manual => {
                        *self.focused_cell_mut() = text;
                        // Move along the row, then down, like a spreadsheet.
                        match self.cursor_col {
                            Column::Substrate => self.cursor_col = Column::Velocity,
                            Column::Velocity => {
                                self.cursor_col = Column::Substrate;
                                if self.cursor_row + 1 < self.rows.len() {
                                    self.cursor_row += 1;
                                }
                            }
                        }
                    }
                    InputMode::CsvFile => self.csv_path = text,
                }
                self.status = "Press c to compute.".to_string();
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(ch) => {
                if self.mode == InputMode::CsvFile || is_numeric_char(ch) {
                    buffer.push(ch);
                }
            }
            _ => {}
        }
    }

    fn focused_cell_mut(&mut self) -> &mut String {
        let row = &mut self.rows[self.cursor_row];
        match self.cursor_col {
            Column::Substrate => &mut row.substrate,
            Column::Velocity => &mut row.velocity,
        }
    }

    /// Build observations from the active input and run the analysis.
    fn compute(&mut self) {
        let observations = match self.mode {
            InputMode::Manual => ObservationSet::from_manual_table(&self.rows),
            InputMode::CsvFile => {
                let path = self.csv_path.trim();
                if path.is_empty() {
                    Err(FitError::invalid_input("enter a CSV path first (Enter to edit)"))
                } else {
                    ObservationSet::from_file(Path::new(path))
                }
            }
        };

        let outcome = observations.and_then(|observations| {
            let result = run_analysis_with(&observations, &self.config)?;
            Ok(Computed { observations, result })
        });

        match outcome {
            Ok(computed) => {
                self.status = format!(
                    "Fitted {} point(s) in {} step(s).",
                    computed.observations.len(),
                    computed.result.iterations
                );
                self.computed = Some(computed);
            }
            Err(err) => {
                log::warn!("analysis failed ({}): {err}", err.kind_name());
                self.status = err.to_string();
                self.computed = None;
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(0)])
            .split(chunks[1]);
        match self.mode {
            InputMode::Manual => self.draw_table(frame, body[0]),
            InputMode::CsvFile => self.draw_path_input(frame, body[0]),
        }
        self.draw_chart(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let d = DISPLAY_DECIMALS;
        let mut lines = vec![Line::from(vec![
            Span::styled("mm", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" Michaelis-Menten fit | input: {}", self.mode.title())),
        ])];

        let results = match &self.computed {
            Some(c) => format!(
                "Vmax = {:.d$} | Km = {:.d$} | R² = {:.d$} | n = {}",
                c.result.params.vmax,
                c.result.params.km,
                c.result.r_squared,
                c.observations.len()
            ),
            None => "Vmax = - | Km = - | R² = -".to_string(),
        };
        lines.push(Line::from(Span::styled(
            results,
            Style::default().add_modifier(Modifier::BOLD),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Observations").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let header = Line::from(Span::styled(
            format!("{:>3}  {:<13} {:<13}", "#", "substrate", "velocity"),
            Style::default().fg(Color::Gray),
        ));
        let visible = (inner.height as usize).saturating_sub(1).max(1);
        let first = self.cursor_row.saturating_sub(visible - 1);

        let mut lines = vec![header];
        for (i, row) in self.rows.iter().enumerate().skip(first).take(visible) {
            let selected = i == self.cursor_row;
            let cell = |col: Column, text: &str| {
                let focused = selected && self.cursor_col == col;
                let shown = match (&self.edit, focused) {
                    (Some(buffer), true) => format!("{buffer}_"),
                    _ => text.to_string(),
                };
                let style = if focused {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default()
                };
                Span::styled(format!("{:<13}", truncate(&shown, 13)), style)
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{:>3}  ", i + 1)),
                cell(Column::Substrate, &row.substrate),
                Span::raw(" "),
                cell(Column::Velocity, &row.velocity),
            ]));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)), inner);
    }

    fn draw_path_input(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let shown = match &self.edit {
            Some(buffer) => format!("{buffer}_"),
            None if self.csv_path.is_empty() => "(Enter to type a path)".to_string(),
            None => self.csv_path.clone(),
        };
        let style = if self.edit.is_some() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let lines = vec![
            Line::from(Span::styled("CSV path:", Style::default().fg(Color::Gray))),
            Line::from(Span::styled(shown, style)),
            Line::from(""),
            Line::from(Span::styled(
                "Columns: substrate, velocity",
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines))
            .wrap(ratatui::widgets::Wrap { trim: false })
            .block(Block::default().title("CSV file").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Fit").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(computed) = &self.computed else {
            let msg = Paragraph::new("No fit yet. Press c to compute.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let series = ChartSeries::from_computed(computed);
        let widget = KineticsChart {
            curve: &series.curve,
            points: &series.points,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: X_LABEL,
            y_label: Y_LABEL,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match (self.mode, self.edit.is_some()) {
            (_, true) => "type value  Enter keep  Esc cancel",
            (InputMode::Manual, false) => {
                "arrows move  Enter edit  a add  d remove  c compute  Tab mode  q quit"
            }
            (InputMode::CsvFile, false) => "Enter edit path  c compute  Tab mode  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Data and bounds for the overlay chart.
struct ChartSeries {
    curve: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl ChartSeries {
    fn from_computed(computed: &Computed) -> Self {
        let points: Vec<(f64, f64)> = computed
            .observations
            .points()
            .iter()
            .map(|p| (p.substrate, p.velocity))
            .collect();
        let curve: Vec<(f64, f64)> = computed
            .result
            .grid_substrate
            .iter()
            .copied()
            .zip(computed.result.grid_predicted.iter().copied())
            .collect();

        let x_max = points
            .iter()
            .chain(curve.iter())
            .map(|p| p.0)
            .fold(0.0_f64, f64::max);
        let x_bounds = if x_max > 0.0 { [0.0, x_max] } else { [0.0, 1.0] };

        let (mut y_min, mut y_max) = (0.0_f64, f64::NEG_INFINITY);
        for &(_, y) in points.iter().chain(curve.iter()) {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !y_max.is_finite() || y_max <= y_min {
            y_min = 0.0;
            y_max = 1.0;
        }
        let pad = ((y_max - y_min) * 0.05).max(1e-12);

        Self {
            curve,
            points,
            x_bounds,
            y_bounds: [y_min - pad, y_max + pad],
        }
    }
}

fn is_numeric_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E')
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let tail: String = s.chars().skip(s.chars().count() + 1 - max).collect();
    format!("…{tail}")
}
