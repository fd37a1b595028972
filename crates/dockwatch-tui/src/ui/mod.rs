//! UI rendering for the TUI application

mod dialogs;
mod header_footer;
mod pages;
pub mod spinner;

use crate::app::{App, Page};
use ratatui::prelude::*;

use dialogs::*;
use header_footer::*;
use pages::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);

    match app.page {
        Page::Main => draw_main(frame, app, chunks[1]),
        Page::Resource(id) => draw_resource(frame, app, id, chunks[1]),
    }

    draw_footer(frame, app, chunks[2]);

    if app.modal.is_some() {
        draw_error_modal(frame, app, area);
    }
}
