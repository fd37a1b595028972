//! Modal dialog builder with consistent styling

use dockwatch_core::ModalChoice;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub struct DialogBuilder<'a> {
    title: &'a str,
    lines: Vec<Line<'a>>,
    width: u16,
    border_color: Color,
}

impl<'a> DialogBuilder<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            lines: Vec::new(),
            width: 50,
            border_color: Color::Yellow,
        }
    }

    pub fn width(mut self, w: u16) -> Self {
        self.width = w;
        self
    }

    pub fn border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    /// Add a message; long lines are wrapped when rendered
    pub fn message(mut self, text: &str) -> Self {
        for raw in text.lines() {
            self.lines.push(Line::from(raw.to_string()));
        }
        self
    }

    pub fn empty_line(mut self) -> Self {
        self.lines.push(Line::from(""));
        self
    }

    /// Return/Quit buttons with the focused one highlighted
    pub fn choices(mut self, focus: ModalChoice) -> Self {
        let return_style = if focus == ModalChoice::Return {
            Style::default().bg(Color::Green).fg(Color::Black).bold()
        } else {
            Style::default().fg(Color::Green)
        };
        let quit_style = if focus == ModalChoice::Quit {
            Style::default().bg(Color::Red).fg(Color::White).bold()
        } else {
            Style::default().fg(Color::Red)
        };

        self.lines.push(Line::from(vec![
            Span::styled("[Return]", return_style),
            Span::raw("    "),
            Span::styled("[Quit]", quit_style),
        ]));
        self
    }

    pub fn help(mut self, text: &'a str) -> Self {
        self.lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )));
        self
    }

    /// Rows needed once lines are wrapped, borders included
    fn height(&self) -> u16 {
        let inner = self.width.saturating_sub(2).max(1) as usize;
        let rows: usize = self
            .lines
            .iter()
            .map(|line| match line.width() {
                0 => 1,
                // One spare row per wrapped line: word breaks can leave gaps
                w if w > inner => w.div_ceil(inner) + 1,
                _ => 1,
            })
            .sum();
        (rows as u16).saturating_add(2)
    }

    /// Render the dialog centered in `area`
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let dialog_area = centered_rect(self.width, self.height(), area);

        frame.render_widget(Clear, dialog_area);

        let dialog = Paragraph::new(self.lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(format!(" {} ", self.title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.border_color)),
            );

        frame.render_widget(dialog, dialog_area);
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(40, 20, area);

        assert_eq!(centered.x, 30);
        assert_eq!(centered.y, 15);
        assert_eq!(centered.width, 40);
        assert_eq!(centered.height, 20);
    }

    #[test]
    fn test_centered_rect_clamped() {
        let area = Rect::new(5, 2, 30, 20);
        let centered = centered_rect(50, 30, area);

        assert_eq!(centered, area);
    }

    #[test]
    fn test_long_message_wraps() {
        let message = "creating network failed: Network error: subnet overlaps";
        let builder = DialogBuilder::new("Error").width(24).message(message);
        assert_eq!(builder.lines.len(), 1);
        assert!(builder.height() >= 5);

        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                builder.render(frame, area);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        for word in message.split_whitespace() {
            assert!(text.contains(word), "missing {:?}", word);
        }
    }

    #[test]
    fn test_dialog_builder_chain() {
        let builder = DialogBuilder::new("Test")
            .width(60)
            .border_color(Color::Red)
            .empty_line()
            .message("first\nsecond")
            .choices(ModalChoice::Return);

        assert_eq!(builder.width, 60);
        assert_eq!(builder.border_color, Color::Red);
        assert_eq!(builder.lines.len(), 4);
    }
}
