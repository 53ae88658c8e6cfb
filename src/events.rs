use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    // Anything but a second `x` cancels a pending kill
    if key.code != KeyCode::Char('x') {
        app.pending_kill = None;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Processes),
        KeyCode::Char('3') => app.set_view(View::Alerts),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Connection
        KeyCode::Char('r') => app.reconnect(),
        KeyCode::Char('d') => app.disconnect(),

        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('t') => app.toggle_theme(),

        // Processes view
        KeyCode::Char('s') if app.current_view == View::Processes => app.cycle_sort(),
        KeyCode::Char('S') if app.current_view == View::Processes => {
            app.toggle_sort_direction()
        }
        KeyCode::Char('/') if app.current_view == View::Processes => app.start_filter(),
        KeyCode::Char('c') if !app.filter_text.is_empty() => app.clear_filter(),
        KeyCode::Char('x') if app.current_view == View::Processes => app.kill_selected(),

        // Alerts view
        KeyCode::Enter if app.current_view == View::Alerts => app.mark_selected_read(),
        KeyCode::Char('a') if app.current_view == View::Alerts => app.mark_all_read(),

        KeyCode::Char('e') => {
            let export_path = app.export_path.clone();
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.filter_active = false,

        // Keep text but exit input mode
        KeyCode::Esc => app.cancel_filter(),

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_filter(),

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => app.filter_push(c),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Content starts with a border and a table header row
            if clicked_row > content_start_row + 1 {
                let item_row = (clicked_row - content_start_row - 2) as usize;
                match app.current_view {
                    View::Processes => {
                        if item_row < app.visible_processes().len() {
                            app.selected_process = item_row;
                            app.pending_kill = None;
                        }
                    }
                    View::Alerts => {
                        if item_row < app.state.alerts.len() {
                            app.selected_alert = item_row;
                        }
                    }
                    View::Overview => {}
                }
            }

            // Tab clicks (row 1, after header)
            if clicked_row == 1 {
                let col = mouse.column;
                // Approximate tab positions: Overview (0-12), Processes (13-27), Alerts (28+)
                if col < 13 {
                    app.set_view(View::Overview);
                } else if col < 28 {
                    app.set_view(View::Processes);
                } else if col < 44 {
                    app.set_view(View::Alerts);
                }
            }
        }

        _ => {}
    }
}
