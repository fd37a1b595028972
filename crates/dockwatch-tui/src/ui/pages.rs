use super::*;
use crate::app::ResourcePanel;
use ansi_to_tui::IntoText;
use dockwatch_core::ResourceStatus;
use dockwatch_provider::ResourceId;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};

/// Menu on the left, one status block per resource on the right
pub(super) fn draw_main(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(area);

    let items: Vec<ListItem> = app
        .menu
        .items()
        .iter()
        .map(|item| ListItem::new(format!(" {}", item.label())))
        .collect();

    let menu = List::new(items)
        .block(
            Block::default()
                .title(" Actions ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black).bold())
        .highlight_symbol("▶");

    frame.render_stateful_widget(menu, columns[0], app.menu.state_mut());

    // The last block takes the remaining height
    let ids = ResourceId::all();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(columns[1]);

    for (id, row) in ids.iter().zip(rows.iter()) {
        let text = status_text(app.panel(*id));
        let block = Paragraph::new(text).block(
            Block::default()
                .title(format!(" {} ", id.label()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(block, *row);
    }
}

/// Status, progress gauges, inspect and logs of one resource
pub(super) fn draw_resource(frame: &mut Frame, app: &App, id: ResourceId, area: Rect) {
    let panel = app.panel(id);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Status block
            Constraint::Length(3), // Gauges
            Constraint::Min(0),    // Inspect + logs
        ])
        .split(area);

    let mut title = format!(" {} ", id.label());
    if let Some(updated) = panel.and_then(|p| p.updated_at) {
        title = format!(" {} - updated {} ", id.label(), updated.format("%H:%M:%S"));
    }
    let status = Paragraph::new(status_text(panel)).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(status, rows[0]);

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let (download, extract) = panel
        .map(|p| (p.download_percent, p.extract_percent))
        .unwrap_or_default();
    frame.render_widget(gauge("Download", download, Color::Green), gauges[0]);
    frame.render_widget(gauge("Extraction", extract, Color::Blue), gauges[1]);

    let details = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(0)])
        .split(rows[2]);

    let inspect = panel
        .map(|p| p.inspect.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("No container information yet");
    let inspect = Paragraph::new(inspect.to_string()).block(
        Block::default()
            .title(" Inspect ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(inspect, details[0]);

    let visible = details[1].height.saturating_sub(2) as usize;
    let logs = Paragraph::new(log_text(panel.map(|p| p.logs.as_str()).unwrap_or(""), visible))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Logs ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(logs, details[1]);
}

fn status_text(panel: Option<&ResourcePanel>) -> String {
    match panel {
        Some(p) if !p.status.is_empty() => p.status.clone(),
        _ => ResourceStatus::default().render(),
    }
}

fn gauge(label: &str, percent: f64, color: Color) -> Gauge<'static> {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    Gauge::default()
        .block(Block::default().title(format!(" {} ", label)).borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{:.1}%", percent))
}

/// Last `visible` lines of the log tail, with ANSI colors applied
fn log_text(logs: &str, visible: usize) -> Text<'static> {
    let lines: Vec<&str> = logs.lines().collect();
    let start = lines.len().saturating_sub(visible);
    let tail = lines[start..].join("\n");
    match tail.into_text() {
        Ok(text) => text,
        Err(_) => Text::raw(tail),
    }
}
