//! Application state and navigation logic.
//!
//! The app is a consumer of the shared store: it keeps the last state it
//! rendered and swaps in a new one whenever the store's watch channel
//! reports a change. Operator commands go to the sync driver (reconnect,
//! disconnect) or to [`Actions`] (kill process), whose outcome arrives back
//! through the store as alerts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indra_types::{ConnectionStatus, Process};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::api::Actions;
use crate::data::Thresholds;
use crate::store::{StoreLimits, SystemState, SystemStore};
use crate::sync::SyncHandle;
use crate::ui::processes::{sort_processes_by, ProcessSort};
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Connection, live readings, trends and host information.
    Overview,
    /// Sortable, filterable process table.
    Processes,
    /// Alerts and analysis insights.
    Alerts,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Processes,
            View::Processes => View::Alerts,
            View::Alerts => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Alerts,
            View::Processes => View::Overview,
            View::Alerts => View::Processes,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Processes => "Processes",
            View::Alerts => "Alerts",
        }
    }
}

/// Handles used to act on the outside world.
struct Controls {
    sync: Option<SyncHandle>,
    actions: Option<(Actions, Handle)>,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    store: SystemStore,
    updates: watch::Receiver<Arc<SystemState>>,
    /// The state currently on screen.
    pub state: Arc<SystemState>,
    pub last_update: Instant,
    pub thresholds: Thresholds,
    controls: Controls,

    // Navigation state
    pub selected_process: usize,
    pub selected_alert: usize,

    // Sorting (Processes view)
    pub sort_column: ProcessSort,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    /// Process awaiting a second `x` to confirm termination.
    pub pending_kill: Option<u32>,

    // UI
    pub theme: Theme,
    pub export_path: PathBuf,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `store`.
    pub fn new(store: SystemStore, thresholds: Thresholds, theme: Theme) -> Self {
        let mut updates = store.watch();
        let state = updates.borrow_and_update().clone();
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            store,
            updates,
            state,
            last_update: Instant::now(),
            thresholds,
            controls: Controls {
                sync: None,
                actions: None,
            },
            selected_process: 0,
            selected_alert: 0,
            sort_column: ProcessSort::default(),
            sort_ascending: false,
            filter_text: String::new(),
            filter_active: false,
            pending_kill: None,
            theme,
            export_path: PathBuf::from("indra-export.json"),
            status_message: None,
        }
    }

    /// Attach the sync driver used for manual reconnect/disconnect.
    pub fn with_sync(mut self, sync: SyncHandle) -> Self {
        self.controls.sync = Some(sync);
        self
    }

    /// Attach the action runner and the runtime its requests run on.
    pub fn with_actions(mut self, actions: Actions, runtime: Handle) -> Self {
        self.controls.actions = Some((actions, runtime));
        self
    }

    /// Detach the sync driver, e.g. to shut it down on exit.
    pub fn take_sync(&mut self) -> Option<SyncHandle> {
        self.controls.sync.take()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Swap in the latest store state if it changed since the last call.
    pub fn refresh(&mut self) -> bool {
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }
        self.state = self.updates.borrow_and_update().clone();
        self.last_update = Instant::now();

        let processes = self.visible_processes().len();
        self.selected_process = self.selected_process.min(processes.saturating_sub(1));
        self.selected_alert = self
            .selected_alert
            .min(self.state.alerts.len().saturating_sub(1));
        true
    }

    pub fn limits(&self) -> StoreLimits {
        self.store.limits()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.state.connection_status
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.pending_kill = None;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Processes => {
                let max = self.visible_processes().len().saturating_sub(1);
                self.selected_process = (self.selected_process + n).min(max);
            }
            View::Alerts => {
                let max = self.state.alerts.len().saturating_sub(1);
                self.selected_alert = (self.selected_alert + n).min(max);
            }
            View::Overview => {}
        }
        self.pending_kill = None;
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Processes => self.selected_process = self.selected_process.saturating_sub(n),
            View::Alerts => self.selected_alert = self.selected_alert.saturating_sub(n),
            View::Overview => {}
        }
        self.pending_kill = None;
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.select_prev_n(usize::MAX);
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.select_next_n(usize::MAX / 2);
    }

    /// Processes after filtering and sorting, in display order.
    pub fn visible_processes(&self) -> Vec<&Process> {
        let mut processes: Vec<&Process> = self
            .state
            .processes
            .iter()
            .filter(|p| self.matches_filter(p))
            .collect();
        sort_processes_by(&mut processes, self.sort_column, self.sort_ascending);
        processes
    }

    /// The process under the cursor in the Processes view.
    pub fn selected_process(&self) -> Option<&Process> {
        self.visible_processes().get(self.selected_process).copied()
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column.
    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_process = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a process matches the current filter (name, owner or pid).
    pub fn matches_filter(&self, process: &Process) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        process.name.to_lowercase().contains(&search)
            || process.owner.to_lowercase().contains(&search)
            || process.pid.to_string() == search
    }

    /// Mark the selected alert as read.
    pub fn mark_selected_read(&mut self) {
        let Some(alert) = self.state.alerts.get(self.selected_alert) else {
            return;
        };
        let id = alert.id.clone();
        if self.store.mark_alert_as_read(&id) {
            self.refresh();
        }
    }

    /// Mark every alert as read.
    pub fn mark_all_read(&mut self) {
        let ids: Vec<String> = self
            .state
            .alerts
            .iter()
            .filter(|a| !a.read)
            .map(|a| a.id.clone())
            .collect();
        for id in &ids {
            self.store.mark_alert_as_read(id);
        }
        self.refresh();
    }

    /// Terminate the selected process. The first call asks for confirmation.
    pub fn kill_selected(&mut self) {
        let Some(pid) = self.selected_process().map(|p| p.pid) else {
            return;
        };

        if self.pending_kill != Some(pid) {
            self.pending_kill = Some(pid);
            self.set_status_message(format!("Press x again to terminate process {}", pid));
            return;
        }
        self.pending_kill = None;

        let Some((actions, runtime)) = &self.controls.actions else {
            self.set_status_message("Process actions are not available".to_string());
            return;
        };
        let actions = actions.clone();
        runtime.spawn(async move {
            // Outcome is recorded as an alert by the action runner
            let _ = actions.kill_process(pid).await;
        });
        self.set_status_message(format!("Terminating process {}...", pid));
    }

    /// Request a new connection attempt.
    pub fn reconnect(&mut self) {
        match &self.controls.sync {
            Some(sync) => {
                sync.connect();
                self.set_status_message("Reconnecting...".to_string());
            }
            None => self.set_status_message("Live connection is not configured".to_string()),
        }
    }

    /// Close the live connection and stop reconnecting.
    pub fn disconnect(&mut self) {
        if let Some(sync) = &self.controls.sync {
            sync.disconnect();
            self.set_status_message("Disconnected".to_string());
        }
    }

    /// Switch between the dark and light themes.
    pub fn toggle_theme(&mut self) {
        self.theme = if self.theme.is_light() {
            Theme::dark()
        } else {
            Theme::light()
        };
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current state to a JSON file.
    pub fn export_state(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.state.export())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
