//! UI rendering

pub mod layout;
pub mod screens;
pub mod theme;

pub use theme::Theme;

use std::time::Duration;

use ratatui::prelude::*;

use crate::app::PinPrompt;

/// Everything a frame needs, borrowed from the app
pub struct View<'a> {
    /// Latest lock snapshot from the context
    pub locked: bool,
    /// Configured idle timeout
    pub timeout: Duration,
    /// Time since the last interaction
    pub idle: Duration,
    /// PIN prompt, when the gateway is waiting for one
    pub prompt: Option<&'a PinPrompt>,
    /// Colors
    pub theme: &'a Theme,
}

/// Main render function: child view, then the lock overlay on top
pub fn render(frame: &mut Frame, view: &View<'_>) {
    let area = frame.area();
    screens::home::render(frame, area, view);
    if view.locked {
        screens::overlay::render(frame, area, view);
    }
}
