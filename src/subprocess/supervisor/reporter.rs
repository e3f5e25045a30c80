//! Destinations for supervisor notifications

use std::sync::Mutex;

use super::types::WatchEvent;

/// Receives heartbeat, stall and timeout notifications as they happen
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &WatchEvent);
}

/// Writes notifications to stderr with the tool prefix
pub struct StderrReporter;

impl ProgressReporter for StderrReporter {
    fn report(&self, event: &WatchEvent) {
        match event {
            WatchEvent::Heartbeat { .. } => tracing::debug!("{}", event),
            WatchEvent::Stall { .. } | WatchEvent::Timeout { .. } => tracing::warn!("{}", event),
        }
        eprintln!("[cargo-diag] {}", event);
    }
}

/// Keeps notifications in memory
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<WatchEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WatchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &WatchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
