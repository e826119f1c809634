use std::f64::consts::PI;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points, Rectangle};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, List,
    ListItem, ListState, Paragraph, Wrap,
};

use match_plots::charts::{ChartSpec, box_summary, fill_points, minute_axis, situation_totals};
use match_plots::config::{self, AppConfig};
use match_plots::directory::load_team_directory;
use match_plots::document::Venue;
use match_plots::error::ErrorKind;
use match_plots::export;
use match_plots::logging;
use match_plots::lookup::MatchLookup;
use match_plots::pipeline::MatchView;
use match_plots::state::{AppState, FormFocus, Outcome};
use match_plots::store::{MatchStore, SqliteMatchStore};

struct App {
    state: AppState,
    lookup: MatchLookup,
    config: AppConfig,
    should_quit: bool,
}

impl App {
    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.state.toggle_focus()
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => self.state.submit(&self.lookup, &self.config.palette),
            KeyCode::Char('r') | KeyCode::Char('R') => self.state.reset(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_current(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn export_current(&mut self) {
        let Some(view) = self.state.current_view() else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        match export::export_view(&self.config.export_dir, view) {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} charts and {} shot rows to {}",
                report.charts,
                report.shot_rows,
                report.dir.display()
            )),
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.state.push_log(format!("[WARN] Export failed: {err}"));
            }
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let config = AppConfig::from_env().context("read configuration")?;
    if let Err(err) = logging::init_file_logging(&config.log_path) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let store: Arc<dyn MatchStore> = Arc::new(
        SqliteMatchStore::open_read_only(&config.db_path)
            .context("match store unavailable (run seed_demo or match_ingest first)")?,
    );
    let home_dir = load_team_directory(store.as_ref(), Venue::Home, &config.excluded_countries)?;
    let away_dir = load_team_directory(store.as_ref(), Venue::Away, &config.excluded_countries)?;
    let leagues = store.distinct_leagues(&config.excluded_countries)?;
    tracing::info!(
        db = %config.db_path.display(),
        home_teams = home_dir.len(),
        away_teams = away_dir.len(),
        leagues = leagues.len(),
        "dashboard starting"
    );

    let mut app = App {
        state: AppState::new(home_dir, away_dir, leagues),
        lookup: MatchLookup::with_shared_cache(store),
        config,
        should_quit: false,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "dashboard loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(40)])
        .split(chunks[1]);
    render_form(frame, body[0], &app.state);
    render_outcome(frame, body[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "Tab Switch list | j/k/↑/↓ Move | Enter Submit | r Reset | e Export | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, area);
    }
}

fn header_text(app: &App) -> String {
    let selection = app
        .state
        .session
        .as_ref()
        .map(|s| format!("{} vs {}", s.selection().home, s.selection().away))
        .unwrap_or_else(|| "no teams".to_string());
    format!(
        "MATCH PLOTS | National leagues: {} | Teams: {} home / {} away | Selected: {}",
        app.state.leagues.len(),
        app.state.home_dir.len(),
        app.state.away_dir.len(),
        selection
    )
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_team_list(
        frame,
        halves[0],
        "Select a Home Team",
        state.home_dir.labels(),
        state.home_cursor,
        state.focus == FormFocus::Home,
    );
    render_team_list(
        frame,
        halves[1],
        "Select an Away Team",
        state.away_dir.labels(),
        state.away_cursor,
        state.focus == FormFocus::Away,
    );
}

fn render_team_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    labels: &[String],
    cursor: usize,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let items = labels
        .iter()
        .map(|label| ListItem::new(label.as_str()))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    if !labels.is_empty() {
        list_state.select(Some(cursor.min(labels.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_outcome(frame: &mut Frame, area: Rect, state: &AppState) {
    let (text, style) = match &state.outcome {
        Some(Outcome::Ready(view)) => {
            render_match(frame, area, view);
            return;
        }
        Some(Outcome::NoMatch(message)) => (message.clone(), Style::default()),
        Some(Outcome::Failed { kind, message }) => {
            let label = match kind {
                ErrorKind::DataShape => "Unexpected match data",
                ErrorKind::Connectivity => "Match store unavailable",
                ErrorKind::NotFound => "No match",
            };
            (
                format!("{label}\n\n{message}\n\nPress Enter to retry."),
                Style::default().fg(Color::Red),
            )
        }
        None => (
            "Pick a home and an away team, then press Enter.".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Plot the Stats of a Selected Match - Only National Leagues")
                .borders(Borders::ALL),
        );
    frame.render_widget(paragraph, area);
}

fn render_match(frame: &mut Frame, area: Rect, view: &MatchView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Min(8),
        ])
        .split(area);

    let header = &view.header;
    let images = format!(
        "{} | {}",
        header.home_image.as_deref().unwrap_or("-"),
        header.away_image.as_deref().unwrap_or("-")
    );
    let header_widget = Paragraph::new(vec![
        Line::from(Span::styled(
            header.headline(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(images, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center),
    ])
    .block(
        Block::default()
            .title(header.details.clone())
            .borders(Borders::ALL),
    );
    frame.render_widget(header_widget, rows[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);
    render_shot_map(frame, top[0], &view.charts.shot_map);
    render_situation_bars(frame, top[1], &view.charts.situation_bars);

    render_touch_metrics(frame, rows[2], view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);
    render_radar(frame, bottom[0], &view.charts.stats_radar);
    render_box(frame, bottom[1], &view.charts.efficiency_box);
}

fn trace_color(hex: &str, fallback: Color) -> Color {
    Color::from_str(hex).unwrap_or(fallback)
}

fn render_shot_map(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    // Terminal markers cannot scale, so xGOT size splits each team into two
    // marker weights.
    const BIG_MARKER: f64 = 0.35;
    let mut series: Vec<(String, Color, Vec<(f64, f64)>, Vec<(f64, f64)>)> = Vec::new();
    for trace in &chart.traces {
        let color = trace_color(&trace.marker.color, Color::White);
        let mut small = Vec::new();
        let mut big = Vec::new();
        for ((x, y), size) in trace.x.iter().zip(trace.y.iter()).zip(trace.marker.size.iter()) {
            let Some(minute) = x.as_number() else {
                continue;
            };
            if *size >= BIG_MARKER {
                big.push((minute, *y));
            } else {
                small.push((minute, *y));
            }
        }
        series.push((trace.name.clone(), color, small, big));
    }

    let mut datasets = Vec::new();
    for (name, color, small, big) in &series {
        datasets.push(
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(*color))
                .data(small),
        );
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(*color))
                .data(big),
        );
    }

    let (x_upper, x_labels) = minute_axis(chart);
    let y_range = chart
        .layout
        .yaxis
        .as_ref()
        .and_then(|axis| axis.range)
        .unwrap_or([0.0, 1.0]);
    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .title(chart.layout.title.clone())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Minutes")
                .bounds([0.0, x_upper])
                .labels(x_labels.into_iter().map(Span::raw).collect()),
        )
        .y_axis(
            Axis::default()
                .title("xG")
                .bounds(y_range)
                .labels(vec![Span::raw("0"), Span::raw("0.5"), Span::raw("1")]),
        );
    frame.render_widget(widget, area);
}

fn render_situation_bars(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let home_color = chart
        .trace(Venue::Home)
        .map(|t| trace_color(&t.marker.color, Color::Green))
        .unwrap_or(Color::Green);
    let away_color = chart
        .trace(Venue::Away)
        .map(|t| trace_color(&t.marker.color, Color::Yellow))
        .unwrap_or(Color::Yellow);

    let mut widget = BarChart::default()
        .block(
            Block::default()
                .title(chart.layout.title.clone())
                .borders(Borders::ALL),
        )
        .bar_width(4)
        .bar_gap(0)
        .group_gap(2);
    for (situation, home, away) in situation_totals(chart) {
        let bars = [
            Bar::default()
                .value((home * 100.0).round() as u64)
                .text_value(format!("{home:.2}"))
                .style(Style::default().fg(home_color)),
            Bar::default()
                .value((away * 100.0).round() as u64)
                .text_value(format!("{away:.2}"))
                .style(Style::default().fg(away_color)),
        ];
        widget = widget.data(BarGroup::default().label(Line::from(situation)).bars(&bars));
    }
    frame.render_widget(widget, area);
}

fn render_touch_metrics(frame: &mut Frame, area: Rect, view: &MatchView) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let (home, away) = view.touch_per_100();
    for (col, team, value) in [
        (cols[0], &view.header.home, home),
        (cols[1], &view.header.away, away),
    ] {
        let metric = Paragraph::new(format!("{value}"))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .title(format!("{team} - Touches on the Opponent Box per 100 Passes"))
                    .borders(Borders::ALL),
            );
        frame.render_widget(metric, col);
    }
}

fn render_radar(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    const RADAR_FILL_STEP: f64 = 0.06;
    let loops = chart
        .traces
        .iter()
        .map(|trace| {
            let color = trace_color(&trace.marker.color, Color::White);
            let axes = trace.r.len().saturating_sub(1).max(1);
            let points = trace
                .r
                .iter()
                .enumerate()
                .map(|(idx, r)| polar_point(*r, idx % axes, axes))
                .collect::<Vec<_>>();
            let fill = if trace.fill.is_some() {
                fill_points(&points, RADAR_FILL_STEP)
            } else {
                Vec::new()
            };
            (color, points, fill)
        })
        .collect::<Vec<_>>();
    let labels = chart
        .traces
        .first()
        .map(|trace| {
            let axes = trace.theta.len().saturating_sub(1);
            trace.theta.iter().take(axes).cloned().collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(chart.layout.title.clone())
                .borders(Borders::ALL),
        )
        .x_bounds([-1.6, 1.6])
        .y_bounds([-1.3, 1.3])
        .paint(move |ctx| {
            let axes = labels.len().max(1);
            for (idx, label) in labels.iter().enumerate() {
                let (x, y) = polar_point(1.0, idx, axes);
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: 0.0,
                    x2: x,
                    y2: y,
                    color: Color::DarkGray,
                });
                ctx.print(x * 1.05, y * 1.05, label.clone());
            }
            ctx.layer();
            for (color, _, fill) in &loops {
                ctx.draw(&Points {
                    coords: fill,
                    color: *color,
                });
            }
            ctx.layer();
            for (color, points, _) in &loops {
                for pair in points.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].0,
                        y1: pair[0].1,
                        x2: pair[1].0,
                        y2: pair[1].1,
                        color: *color,
                    });
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn polar_point(r: f64, idx: usize, axes: usize) -> (f64, f64) {
    let angle = PI / 2.0 - 2.0 * PI * idx as f64 / axes as f64;
    let r = r.clamp(0.0, 1.0);
    (r * angle.cos(), r * angle.sin())
}

fn render_box(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let boxes = chart
        .traces
        .iter()
        .enumerate()
        .map(|(idx, trace)| {
            (
                idx as f64 + 0.5,
                trace.name.clone(),
                trace_color(&trace.marker.color, Color::White),
                box_summary(&trace.y),
            )
        })
        .collect::<Vec<_>>();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(chart.layout.title.clone())
                .borders(Borders::ALL),
        )
        .x_bounds([0.0, boxes.len().max(1) as f64])
        .y_bounds([-0.1, 1.0])
        .paint(move |ctx| {
            for (center, name, color, summary) in &boxes {
                ctx.print(center - 0.3, -0.08, name.clone());
                let Some(s) = summary else {
                    continue;
                };
                let color = *color;
                ctx.draw(&Rectangle {
                    x: center - 0.2,
                    y: s.q1,
                    width: 0.4,
                    height: (s.q3 - s.q1).max(0.001),
                    color,
                });
                for (y1, y2) in [(s.min, s.q1), (s.q3, s.max)] {
                    ctx.draw(&CanvasLine {
                        x1: *center,
                        y1,
                        x2: *center,
                        y2,
                        color,
                    });
                }
                for y in [s.min, s.median, s.max] {
                    ctx.draw(&CanvasLine {
                        x1: center - 0.2,
                        y1: y,
                        x2: center + 0.2,
                        y2: y,
                        color,
                    });
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Match Plots - Help",
        "",
        "Form:",
        "  Tab / h / l  Switch home/away list",
        "  j/k or ↑/↓   Move",
        "  Enter        Submit selection",
        "  r            Reset selection",
        "",
        "View:",
        "  e            Export charts (JSON) and tables (xlsx)",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
