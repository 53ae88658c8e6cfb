//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::HealthStatus;

/// Render the header bar.
///
/// Displays: connection indicator, REST backend reachability, hostname,
/// overall health and unread alerts.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.state;
    let status = state.connection_status;

    let mut spans = vec![
        Span::styled(" ● ", app.theme.connection_style(status)),
        Span::styled("INDRA ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(status.label(), app.theme.connection_style(status)),
        Span::raw(" │ "),
        backend_span(app),
    ];

    if let Some(info) = &state.system_info {
        spans.push(Span::raw(" │ "));
        spans.push(Span::raw(info.hostname.clone()));
    }

    let health = state
        .metrics
        .as_ref()
        .map(|m| app.thresholds.overall(m))
        .unwrap_or(HealthStatus::Healthy);
    spans.push(Span::raw(" │ health "));
    spans.push(Span::styled(health.symbol(), app.theme.status_style(health)));

    let unread = state.unread_alerts();
    spans.push(Span::raw(" │ "));
    if unread > 0 {
        spans.push(Span::styled(
            format!("{}", unread),
            Style::default().fg(app.theme.warning).add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled("0", Style::default().add_modifier(Modifier::DIM)));
    }
    spans.push(Span::raw(" unread"));

    if state.is_loading {
        spans.push(Span::styled(" │ loading…", Style::default().add_modifier(Modifier::DIM)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn backend_span(app: &App) -> Span<'static> {
    match app.state.backend_reachable {
        Some(true) => Span::styled("API ok", Style::default().fg(app.theme.healthy)),
        Some(false) => Span::styled(
            "API down",
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("API …", Style::default().add_modifier(Modifier::DIM)),
    }
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let alerts_title = match app.state.unread_alerts() {
        0 => " 3:Alerts ".to_string(),
        n => format!(" 3:Alerts ({}) ", n),
    };
    let titles: Vec<Line> = vec![
        Line::from(" 1:Overview "),
        Line::from(" 2:Processes "),
        Line::from(alerts_title),
    ];

    let selected = match app.current_view {
        View::Overview => 0,
        View::Processes => 1,
        View::Alerts => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows time since the last update and the controls for the current view.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Overview => "r:reconnect d:disconnect Tab:switch ?:help q:quit",
        View::Processes if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        View::Processes => "/:search s:sort S:reverse x:kill Tab:switch ?:help q:quit",
        View::Alerts => "Enter:mark read a:mark all Tab:switch ?:help q:quit",
    };

    let status = format!(
        " {} | Updated {:.1}s ago | {}",
        app.current_view.label(),
        app.last_update.elapsed().as_secs_f64(),
        controls,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/1-3     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        section(" Processes"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from("  x x       Terminate process"),
        Line::from(""),
        section(" Alerts"),
        Line::from("  Enter     Mark alert as read"),
        Line::from("  a         Mark all as read"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Reconnect"),
        Line::from("  d         Disconnect"),
        Line::from("  e         Export to JSON"),
        Line::from("  t         Toggle theme"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 30u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
