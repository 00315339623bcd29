//! Child view: shows what descendants see through the lock context

use std::time::Duration;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::View;

fn seconds(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Draw the child view
pub fn render(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;

    let block = Block::default()
        .title(" idlelock ")
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Status
            Constraint::Length(1), // Timeout
            Constraint::Length(1), // Idle
            Constraint::Min(1),    // Spacer
            Constraint::Length(1), // Help
        ])
        .split(inner);

    let (status, status_style) = if view.locked {
        ("Locked", theme.warning())
    } else {
        ("Unlocked", theme.success())
    };

    let status_line = Line::from(vec![
        Span::styled("Status:       ", theme.text_secondary()),
        Span::styled(status, status_style),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[0]);

    let timeout_line = Line::from(vec![
        Span::styled("Idle timeout: ", theme.text_secondary()),
        Span::styled(seconds(view.timeout), theme.text()),
    ]);
    frame.render_widget(Paragraph::new(timeout_line), chunks[1]);

    let idle_line = Line::from(vec![
        Span::styled("Idle for:     ", theme.text_secondary()),
        Span::styled(seconds(view.idle), theme.text()),
    ]);
    frame.render_widget(Paragraph::new(idle_line), chunks[2]);

    let help = Paragraph::new("Press any key or move the mouse to stay unlocked    [q] Quit")
        .style(theme.text_muted())
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[4]);
}
