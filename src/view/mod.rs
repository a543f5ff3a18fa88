//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, column widths, scrollable lists)
//! - `layout`: Main layout structure (link input, account box, sidebar)
//! - `content`: Track table of the loaded playlist
//! - `progress`: Seek bar with transport state
//! - `overlays`: Modal overlays (error, help)
//!
//! Rendering only reads the model. Nothing here mutates state.

mod utils;
mod layout;
mod content;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::AppModel;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, model: &AppModel) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Link input + account
                Constraint::Min(0),    // Main content (sidebar + tracks)
                Constraint::Length(3), // Seek bar with playback info
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], model);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Sidebar
                Constraint::Percentage(70), // Track table
            ])
            .split(chunks[1]);

        layout::render_sidebar(frame, main_chunks[0], model);
        content::render_track_table(frame, main_chunks[1], model);

        progress::render_progress_bar(frame, chunks[2], model);

        if model.ui.error_message.is_some() {
            overlays::render_error_notification(frame, &model.ui);
        }

        if model.ui.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
