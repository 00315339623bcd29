//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Raw terminal input (keys, mouse, resize)
    Input(CrosstermEvent),
    /// Terminal tick (for redraws)
    Tick,
}

/// Event handler that reads the terminal in a separate task
pub struct EventHandler {
    /// Receiver for events
    receiver: mpsc::UnboundedReceiver<Event>,
    /// Reader task
    task: JoinHandle<()>,
}

impl EventHandler {
    /// Start reading terminal events and emitting ticks every `tick_rate`
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut interval = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    _ = interval.tick() => Event::Tick,
                    input = reader.next() => match input {
                        Some(Ok(input)) => Event::Input(input),
                        Some(Err(e)) => {
                            tracing::warn!("Terminal read error: {}", e);
                            break;
                        }
                        None => break,
                    },
                };

                if sender.send(event).is_err() {
                    break;
                }
            }
        });

        Self { receiver, task }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
