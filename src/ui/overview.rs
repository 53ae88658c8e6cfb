//! Overview rendering.
//!
//! Left: live gauges for each tracked resource plus network rates.
//! Right: averages, peaks and a sparkline over the retained history, and
//! host information.

use indra_types::MetricsSnapshot;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

use super::format_bytes;
use crate::app::App;
use crate::data::{format_uptime, Resource};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the Overview.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_live(frame, app, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[1]);
    render_trends(frame, app, right[0]);
    render_system_info(frame, app, right[1]);
}

fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_live(frame: &mut Frame, app: &App, area: Rect) {
    let outer = block(app, " Live ".to_string());
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let Some(metrics) = app.state.metrics.as_ref() else {
        let text = if app.state.connection_status.is_active() {
            "Waiting for metrics..."
        } else {
            "No metrics yet. Press r to connect."
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().add_modifier(Modifier::DIM)),
            inner,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    for (i, resource) in Resource::ALL.iter().enumerate() {
        let pct = resource.reading(metrics);
        let status = app.thresholds.classify(*resource, pct);
        let gauge = Gauge::default()
            .gauge_style(app.theme.status_style(status))
            .ratio(if pct.is_finite() { (pct / 100.0).clamp(0.0, 1.0) } else { 0.0 })
            .label(format!("{:<7}{:>5.1}% {}", resource, pct, status.symbol()));
        frame.render_widget(gauge, rows[i]);
    }

    let network = Line::from(vec![
        Span::styled("Net    ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "↓ {}/s  ↑ {}/s",
            format_bytes(metrics.network.download_speed),
            format_bytes(metrics.network.upload_speed)
        )),
    ]);
    frame.render_widget(Paragraph::new(network), rows[4]);

    let mut details = vec![format!(
        "Memory {} / {}",
        format_bytes(metrics.memory.used),
        format_bytes(metrics.memory.total)
    )];
    if metrics.cpu.cores > 0 {
        details.push(format!("{} cores @ {:.0} MHz", metrics.cpu.cores, metrics.cpu.frequency));
    }
    if let Some(temp) = metrics.cpu.temperature {
        details.push(format!("CPU temperature {:.0}°C", temp));
    }
    let lines: Vec<Line> = details.into_iter().map(Line::from).collect();
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().add_modifier(Modifier::DIM)),
        rows[5],
    );
}

fn render_trends(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.state.history;

    let header = Row::new(vec!["", "Avg", "Peak", "Trend"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = Resource::ALL
        .iter()
        .map(|resource| {
            let reading = |s: &MetricsSnapshot| resource.reading(s);
            let avg = history.average(reading);
            let peak = history.peak(reading);
            let peak_style = peak
                .map(|p| app.theme.status_style(app.thresholds.classify(*resource, p)))
                .unwrap_or_default();
            let values: Vec<f64> = history.iter().map(reading).collect();

            Row::new(vec![
                Cell::from(resource.to_string()),
                Cell::from(format_percent(avg)),
                Cell::from(format_percent(peak)).style(peak_style),
                Cell::from(render_sparkline(&values)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Min(8),
    ];

    let title = format!(" Trend ({}/{} samples) ", history.len(), history.capacity());
    let table = Table::new(rows, widths).header(header).block(block(app, title));
    frame.render_widget(table, area);
}

fn render_system_info(frame: &mut Frame, app: &App, area: Rect) {
    let Some(info) = app.state.system_info.as_ref() else {
        frame.render_widget(
            Paragraph::new("System information not loaded")
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(block(app, " System ".to_string())),
            area,
        );
        return;
    };

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<10}", name), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(value),
        ])
    };

    let lines = vec![
        field("Host", info.hostname.clone()),
        field("Platform", format!("{} {}", info.platform, info.os_version)),
        field("Arch", info.architecture.clone()),
        field("CPU", info.cpu_model.clone()),
        field("Memory", format_bytes(info.total_memory)),
        field("Uptime", format_uptime(info.uptime)),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block(app, " System ".to_string())),
        area,
    );
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Render percentages (0-100) as a sparkline of the most recent samples.
fn render_sparkline(values: &[f64]) -> String {
    const WIDTH: usize = 20;
    let start = values.len().saturating_sub(WIDTH);
    values[start..]
        .iter()
        .map(|v| {
            let level = ((v.clamp(0.0, 100.0) / 100.0) * 7.0).round() as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}
