use super::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub(super) fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let page = match app.page {
        Page::Main => "Menu".to_string(),
        Page::Resource(id) => id.label().to_string(),
    };

    let mut spans = vec![
        Span::styled(page, Style::default().fg(Color::White).bold()),
    ];
    if let Some(command) = app.last_command {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            spinner::frame(app.spinner_frame),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {}", command.label()),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" dockwatch - Container Status ")
            .title_style(Style::default().fg(Color::Cyan).bold())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

/// Context-sensitive key help
pub(super) fn footer_text(app: &App) -> String {
    if app.modal.is_some() {
        return "←/→: Choose  Enter: Confirm  r/Esc: Return  q: Quit".to_string();
    }
    match app.page {
        Page::Main => "j/k: Navigate  Enter: Run  1/2: NATS/Project  q/Esc: Quit".to_string(),
        Page::Resource(_) => "Tab: Other resource  Esc/q: Back".to_string(),
    }
}

pub(super) fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut text = footer_text(app);
    if let Some(message) = &app.status_message {
        text = format!("{}  |  {}", message, text);
    }

    let footer = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(footer, area);
}
