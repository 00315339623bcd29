//! Lock overlay drawn over the child view while locked

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ui::layout::centered_rect;
use crate::ui::View;

/// Unlock affordance label
pub const UNLOCK_LABEL: &str = "[ Unlock ]";

/// Where the overlay's parts go for a given terminal area
///
/// Shared by rendering and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub dialog: Rect,
    pub message: Rect,
    pub pin: Rect,
    pub error: Rect,
    pub button: Rect,
    pub help: Rect,
}

impl OverlayLayout {
    /// Compute the overlay layout
    pub fn new(area: Rect) -> Self {
        let dialog = centered_rect(60, 50, area);
        let inner = Block::default().borders(Borders::ALL).inner(dialog);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2), // Message
                Constraint::Length(1), // PIN
                Constraint::Length(1), // Error
                Constraint::Min(0),    // Spacer
                Constraint::Length(1), // Button
                Constraint::Length(1), // Help
            ])
            .split(inner);

        let row = chunks[4];
        let width = (UNLOCK_LABEL.len() as u16).min(row.width);
        let button = Rect::new(row.x + (row.width - width) / 2, row.y, width, row.height);

        Self {
            dialog,
            message: chunks[0],
            pin: chunks[1],
            error: chunks[2],
            button,
            help: chunks[5],
        }
    }
}

/// Draw the lock overlay
pub fn render(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;
    let layout = OverlayLayout::new(area);

    // Dim the child view behind the dialog
    frame.render_widget(Block::default().style(theme.backdrop()), area);
    frame.render_widget(Clear, layout.dialog);

    let block = Block::default()
        .title(" Locked ")
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());
    frame.render_widget(block, layout.dialog);

    match view.prompt {
        None => {
            let message = Paragraph::new("Locked due to inactivity\nUnlock to continue")
                .style(theme.text())
                .alignment(Alignment::Center);
            frame.render_widget(message, layout.message);

            let button = Paragraph::new(UNLOCK_LABEL)
                .style(theme.button())
                .alignment(Alignment::Center);
            frame.render_widget(button, layout.button);

            let help = Paragraph::new("[Enter] Unlock    [Ctrl+C] Quit")
                .style(theme.text_muted())
                .alignment(Alignment::Center);
            frame.render_widget(help, layout.help);
        }
        Some(prompt) => {
            let message = Paragraph::new(prompt.message.as_str())
                .style(theme.text())
                .alignment(Alignment::Center);
            frame.render_widget(message, layout.message);

            let masked = format!("[ {} ]", "●".repeat(prompt.input.len()));
            let pin = Paragraph::new(masked)
                .style(theme.text())
                .alignment(Alignment::Center);
            frame.render_widget(pin, layout.pin);

            if let Some(error) = &prompt.error {
                let error = Paragraph::new(error.as_str())
                    .style(theme.danger())
                    .alignment(Alignment::Center);
                frame.render_widget(error, layout.error);
            }

            let help = Paragraph::new("[Enter] Submit    [Esc] Cancel")
                .style(theme.text_muted())
                .alignment(Alignment::Center);
            frame.render_widget(help, layout.help);
        }
    }
}
