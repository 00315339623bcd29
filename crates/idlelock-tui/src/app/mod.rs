//! Application state and event handling

mod config;
mod events;
mod state;

pub use config::{ConfigError, TuiConfig, CONFIG_ENV};
pub use events::{Event, EventHandler};
pub use state::{AppState, PinPrompt};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEventKind,
};
use idlelock_core::{
    AuthenticationGateway, LockConfig, LockContext, LockHandle, LockProvider, LockState,
    Result,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use crate::auth::PromptRequest;
use crate::surface::ActivitySurface;
use crate::ui::{self, layout::hit, screens::overlay::OverlayLayout, Theme, View};

/// Redraw interval
const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application struct
pub struct App {
    /// Mounted lock; unmounted when the app shuts down
    provider: LockProvider,

    /// Sends unlock requests from the overlay
    handle: LockHandle,

    /// Read-only lock state for rendering
    context: LockContext,

    /// Forwards every interaction as activity
    surface: ActivitySurface,

    /// PIN prompts from the gateway
    prompts: mpsc::UnboundedReceiver<PromptRequest>,

    /// Application state
    pub state: AppState,

    /// Colors
    theme: Theme,

    /// Last drawn terminal area, for mouse hit-testing
    area: Rect,

    /// Whether the app should quit
    pub should_quit: bool,
}

impl App {
    /// Mount the lock and create the application
    ///
    /// `prompts` carries PIN requests from the gateway; pass a receiver whose
    /// sender is dropped when the gateway never prompts.
    pub fn new(
        config: LockConfig,
        gateway: Arc<dyn AuthenticationGateway>,
        prompts: mpsc::UnboundedReceiver<PromptRequest>,
    ) -> Result<Self> {
        let provider = LockProvider::mount(config, gateway)?;
        let handle = provider.handle();

        Ok(Self {
            context: provider.context(),
            surface: ActivitySurface::new(handle.clone()),
            handle,
            provider,
            prompts,
            state: AppState::new(),
            theme: Theme::default(),
            area: Rect::default(),
            should_quit: false,
        })
    }

    /// Run the application main loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut events = EventHandler::new(TICK_RATE);
        let mut changes = self.context.clone();

        while !self.should_quit {
            terminal.draw(|frame| {
                self.area = frame.area();
                ui::render(frame, &self.view());
            })?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.should_quit = true,
                },
                Some(request) = self.prompts.recv() => self.begin_prompt(request),
                changed = changes.changed() => match changed {
                    Ok(state) => self.on_lock_state(state),
                    Err(_) => self.should_quit = true,
                },
            }
        }

        Ok(())
    }

    /// Unmount the lock provider
    pub async fn shutdown(self) {
        self.provider.unmount().await;
    }

    /// Borrow what the renderer needs
    pub fn view(&self) -> View<'_> {
        View {
            locked: self.context.is_locked(),
            timeout: self.provider.timeout(),
            idle: self.state.last_activity.elapsed(),
            prompt: self.state.pin_prompt.as_ref(),
            theme: &self.theme,
        }
    }

    /// Whether the lock overlay is up
    pub fn is_locked(&self) -> bool {
        self.context.is_locked()
    }

    /// Process one application event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            // The loop redraws after every event
            Event::Tick => {}
            Event::Input(input) => self.handle_input(input),
        }
    }

    /// Show a PIN prompt requested by the gateway
    pub fn begin_prompt(&mut self, request: PromptRequest) {
        if let Some(stale) = self.state.pin_prompt.take() {
            stale.cancel();
        }
        self.state.pin_prompt = Some(PinPrompt::from_request(request));
    }

    /// React to a published lock state
    ///
    /// Unlocking restarts the idle timer, so the idle counter restarts with it.
    pub fn on_lock_state(&mut self, state: LockState) {
        if !state.is_locked() {
            self.state.last_activity = Instant::now();
        }
    }

    /// Record the drawn area without a terminal (used by mouse hit-testing)
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    fn handle_input(&mut self, input: CrosstermEvent) {
        // Activity while locked does not touch the idle timer
        if self.surface.forward(&input).is_some() && !self.is_locked() {
            self.state.last_activity = Instant::now();
        }

        match input {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            CrosstermEvent::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left)
                    && self.is_locked()
                    && self.state.pin_prompt.is_none()
                    && hit(OverlayLayout::new(self.area).button, mouse.column, mouse.row)
                {
                    self.request_unlock();
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Global quit handler
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.state.pin_prompt.is_some() {
            self.handle_prompt_key(key.code);
        } else if self.is_locked() {
            self.handle_overlay_key(key.code);
        } else if key.code == KeyCode::Char('q') {
            self.should_quit = true;
        }
    }

    fn handle_overlay_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('u') => self.request_unlock(),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                if let Some(prompt) = self.state.pin_prompt.take() {
                    prompt.submit();
                }
            }
            KeyCode::Esc => {
                if let Some(prompt) = self.state.pin_prompt.take() {
                    prompt.cancel();
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.state.pin_prompt.as_mut() {
                    prompt.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.state.pin_prompt.as_mut() {
                    prompt.push(c);
                }
            }
            _ => {}
        }
    }

    fn request_unlock(&self) {
        if self.handle.request_unlock().is_err() {
            tracing::debug!("Lock unmounted; unlock request dropped");
        }
    }
}
