//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use indra_types::{AlertKind, ConnectionStatus, Severity};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::HealthStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub warning: Color,
    pub critical: Color,
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
    light: bool,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self::with_palette(Color::Cyan, Color::Gray, Color::DarkGray, false)
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self::with_palette(Color::Blue, Color::DarkGray, Color::LightBlue, true)
    }

    /// Status colors are the same in both themes.
    fn with_palette(accent: Color, muted: Color, selection: Color, light: bool) -> Self {
        let accent_bold = Style::default().fg(accent).add_modifier(Modifier::BOLD);
        Self {
            highlight: accent,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: muted,
            header: accent_bold,
            selected: Style::default().bg(selection).add_modifier(Modifier::BOLD),
            tab_active: accent_bold,
            tab_inactive: Style::default().fg(muted),
            border_type: BorderType::Rounded,
            light,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn is_light(&self) -> bool {
        self.light
    }

    /// Get style for a health status
    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    pub fn connection_style(&self, status: ConnectionStatus) -> Style {
        match status {
            ConnectionStatus::Connected => Style::default().fg(self.healthy),
            ConnectionStatus::Connecting => Style::default().fg(self.warning),
            ConnectionStatus::Disconnected => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    pub fn alert_style(&self, kind: AlertKind) -> Style {
        match kind {
            AlertKind::Info => Style::default().fg(self.highlight),
            AlertKind::Success => Style::default().fg(self.healthy),
            AlertKind::Warning => Style::default().fg(self.warning),
            AlertKind::Error => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Low => Style::default().fg(self.healthy),
            Severity::Medium => Style::default().fg(self.warning),
            Severity::High | Severity::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }
}
