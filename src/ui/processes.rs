//! Processes view rendering.
//!
//! A sortable, filterable table of the processes last fetched from the API.

use std::cmp::Ordering;

use indra_types::{Process, ProcessStatus};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::{HealthStatus, Resource};

/// Column to sort by in the Processes view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessSort {
    #[default]
    Cpu,
    Memory,
    Pid,
    Name,
    Status,
}

impl ProcessSort {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            ProcessSort::Cpu => ProcessSort::Memory,
            ProcessSort::Memory => ProcessSort::Pid,
            ProcessSort::Pid => ProcessSort::Name,
            ProcessSort::Name => ProcessSort::Status,
            ProcessSort::Status => ProcessSort::Cpu,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessSort::Cpu => "cpu",
            ProcessSort::Memory => "mem",
            ProcessSort::Pid => "pid",
            ProcessSort::Name => "name",
            ProcessSort::Status => "status",
        }
    }
}

/// Sort processes by the given column. Ties fall back to the pid.
pub fn sort_processes_by(processes: &mut [&Process], column: ProcessSort, ascending: bool) {
    processes.sort_by(|a, b| {
        let ordering = match column {
            ProcessSort::Cpu => a.cpu_usage.partial_cmp(&b.cpu_usage).unwrap_or(Ordering::Equal),
            ProcessSort::Memory => a
                .memory_usage
                .partial_cmp(&b.memory_usage)
                .unwrap_or(Ordering::Equal),
            ProcessSort::Pid => a.pid.cmp(&b.pid),
            ProcessSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProcessSort::Status => status_rank(a.status).cmp(&status_rank(b.status)),
        };
        let ordering = if ascending { ordering } else { ordering.reverse() };
        ordering.then_with(|| a.pid.cmp(&b.pid))
    });
}

fn status_rank(status: ProcessStatus) -> u8 {
    match status {
        ProcessStatus::Running => 0,
        ProcessStatus::Sleeping => 1,
        ProcessStatus::Stopped => 2,
        ProcessStatus::Unknown => 3,
    }
}

fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Running => "running",
        ProcessStatus::Sleeping => "sleeping",
        ProcessStatus::Stopped => "stopped",
        ProcessStatus::Unknown => "?",
    }
}

fn format_header(label: &str, column: ProcessSort, app: &App) -> String {
    if app.sort_column == column {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        format!("{}{}", label, arrow)
    } else {
        label.to_string()
    }
}

/// Render the Processes view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let processes = app.visible_processes();

    let header = Row::new(vec![
        Cell::from(format_header("PID", ProcessSort::Pid, app)),
        Cell::from(format_header("Name", ProcessSort::Name, app)),
        Cell::from(format_header("CPU%", ProcessSort::Cpu, app)),
        Cell::from(format_header("Mem%", ProcessSort::Memory, app)),
        Cell::from(format_header("Status", ProcessSort::Status, app)),
        Cell::from("Owner"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = processes
        .iter()
        .map(|p| {
            let cpu = app.thresholds.classify(Resource::Cpu, p.cpu_usage);
            let cpu_style = if cpu == HealthStatus::Healthy {
                Style::default()
            } else {
                app.theme.status_style(cpu)
            };
            let row_style = if app.pending_kill == Some(p.pid) {
                Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(p.pid.to_string()),
                Cell::from(p.name.clone()),
                Cell::from(format!("{:.1}", p.cpu_usage)).style(cpu_style),
                Cell::from(format!("{:.1}", p.memory_usage)),
                Cell::from(status_label(p.status)),
                Cell::from(p.owner.clone()),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Fill(3),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Fill(1),
    ];

    let selected = app.selected_process.min(processes.len().saturating_sub(1));

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !processes.is_empty() {
        format!(" [{}/{}]", selected + 1, processes.len())
    } else {
        String::new()
    };

    let title = format!(
        " Processes ({}/{}) [s:sort {}{}]{}{} ",
        processes.len(),
        app.state.processes.len(),
        app.sort_column.label(),
        if app.sort_ascending { "↑" } else { "↓" },
        filter_info,
        position_info
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
    if !processes.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(pid: u32, name: &str, cpu: f64, memory: f64) -> Process {
        Process {
            pid,
            name: name.to_string(),
            cpu_usage: cpu,
            memory_usage: memory,
            ..Default::default()
        }
    }

    fn pids(processes: &[&Process]) -> Vec<u32> {
        processes.iter().map(|p| p.pid).collect()
    }

    #[test]
    fn test_sort_columns() {
        let all = [
            process(3, "bash", 5.0, 1.0),
            process(1, "Xorg", 20.0, 8.0),
            process(2, "agetty", 5.0, 0.1),
        ];
        let mut list: Vec<&Process> = all.iter().collect();

        sort_processes_by(&mut list, ProcessSort::Cpu, false);
        // Equal CPU falls back to pid order
        assert_eq!(pids(&list), vec![1, 2, 3]);

        sort_processes_by(&mut list, ProcessSort::Memory, true);
        assert_eq!(pids(&list), vec![2, 3, 1]);

        sort_processes_by(&mut list, ProcessSort::Name, true);
        assert_eq!(pids(&list), vec![2, 3, 1]);

        sort_processes_by(&mut list, ProcessSort::Pid, false);
        assert_eq!(pids(&list), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_cycle_returns_to_start() {
        let mut column = ProcessSort::default();
        for _ in 0..5 {
            column = column.next();
        }
        assert_eq!(column, ProcessSort::Cpu);
    }
}
