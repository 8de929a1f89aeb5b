use std::sync::{Arc, Mutex};

use quiz_core::quiz::QuizEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives engine state changes. Rendering lives entirely on the sink side.
pub trait QuizEventSink: Send + Sync {
    fn emit(&self, event: &QuizEvent);
}

pub(crate) fn emit_all(sink: &dyn QuizEventSink, events: Vec<QuizEvent>) {
    for event in &events {
        sink.emit(event);
    }
}

/// Keeps every event in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<QuizEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<QuizEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl QuizEventSink for RecordingSink {
    fn emit(&self, event: &QuizEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

/// Forwards events to another task over an unbounded channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<QuizEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QuizEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl QuizEventSink for ChannelSink {
    fn emit(&self, event: &QuizEvent) {
        // receiver gone means nobody is watching any more
        let _ = self.tx.send(event.clone());
    }
}

/// Logs each event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl QuizEventSink for TracingSink {
    fn emit(&self, event: &QuizEvent) {
        debug!(?event, "quiz event");
    }
}
