//! Alerts view rendering.
//!
//! Top: alerts, most recent first, unread ones in bold.
//! Bottom: analysis insights with their recommendations.

use indra_types::{AlertKind, Insight, InsightKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Render the Alerts view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_alerts(frame, app, chunks[0]);
    render_insights(frame, app, chunks[1]);
}

fn kind_label(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Info => "info",
        AlertKind::Warning => "warn",
        AlertKind::Error => "error",
        AlertKind::Success => "ok",
    }
}

/// Format a unix timestamp in milliseconds as UTC wall-clock time.
fn format_time(timestamp_ms: u64) -> String {
    let secs = (timestamp_ms / 1000) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn render_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = &app.state.alerts;

    let header = Row::new(vec!["Time", "Type", "Title", "Message"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = alerts
        .iter()
        .map(|alert| {
            let row_style = if alert.read {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let mut message = alert.message.clone();
            if let Some(action) = alert.actions.first() {
                message.push_str(&format!(" [{}]", action.label));
            }
            Row::new(vec![
                Cell::from(format_time(alert.timestamp_ms)),
                Cell::from(kind_label(alert.kind)).style(app.theme.alert_style(alert.kind)),
                Cell::from(alert.title.clone()),
                Cell::from(message),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Fill(1),
        Constraint::Fill(2),
    ];

    let title = format!(
        " Alerts ({} unread / {} of {}) ",
        app.state.unread_alerts(),
        alerts.len(),
        app.limits().max_alerts
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !alerts.is_empty() {
        state.select(Some(app.selected_alert.min(alerts.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn insight_tag(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Optimization => "OPT",
        InsightKind::Security => "SEC",
        InsightKind::Performance => "PERF",
        InsightKind::Maintenance => "MAINT",
    }
}

fn insight_item<'a>(app: &App, insight: &'a Insight) -> ListItem<'a> {
    let mut title = vec![
        Span::styled(
            format!("{:<6}", insight_tag(insight.kind)),
            app.theme.severity_style(insight.severity),
        ),
        Span::styled(insight.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if insight.applied {
        title.push(Span::styled(" (applied)", Style::default().add_modifier(Modifier::DIM)));
    }
    let mut lines = vec![Line::from(title), Line::from(format!("      {}", insight.description))];
    if !insight.recommendation.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("      → {}", insight.recommendation),
            Style::default().fg(app.theme.highlight),
        )));
    }
    ListItem::new(lines)
}

fn render_insights(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .state
        .insights
        .iter()
        .map(|insight| insight_item(app, insight))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Insights ({}) ", app.state.insights.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(list, area);
}
