use super::*;
use crate::widgets::DialogBuilder;

pub(super) fn draw_error_modal(frame: &mut Frame, app: &App, area: Rect) {
    let Some(modal) = &app.modal else {
        return;
    };

    let width = area.width.saturating_sub(4).clamp(30, 70);
    let mut builder = DialogBuilder::new("Error")
        .width(width)
        .border_color(Color::Red)
        .empty_line()
        .message(&modal.message)
        .empty_line()
        .choices(modal.focus);

    if !app.queued_modals.is_empty() {
        builder = builder
            .empty_line()
            .help("more errors waiting");
    }

    builder.render(frame, area);
}
