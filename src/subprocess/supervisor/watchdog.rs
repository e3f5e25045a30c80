//! Timer bookkeeping for a supervised child
//!
//! The watchdog owns no I/O. The run loop tells it when output arrived and
//! asks it, once per wait cycle, which notifications are due.

use std::time::{Duration, Instant};

use super::progress::ArtifactProgress;
use super::types::{WatchEvent, WatchSettings};

#[derive(Debug)]
pub struct Watchdog {
    settings: WatchSettings,
    started: Instant,
    last_output: Instant,
    stall_warned: bool,
    pid: Option<u32>,
}

impl Watchdog {
    pub fn new(settings: WatchSettings, now: Instant, pid: Option<u32>) -> Self {
        Self {
            settings,
            started: now,
            last_output: now,
            stall_warned: false,
            pid,
        }
    }

    /// Any line on either stream re-arms the stall warning
    pub fn record_output(&mut self, now: Instant) {
        self.last_output = now;
        self.stall_warned = false;
    }

    pub fn deadline(&self) -> Instant {
        self.started + self.settings.overall_timeout
    }

    /// How long the next readiness wait may block
    pub fn poll_interval(&self, now: Instant) -> Duration {
        let remaining = self.deadline().saturating_duration_since(now);
        self.settings.heartbeat_interval.min(remaining)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn silent(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_output)
    }

    /// Evaluate the thresholds at `now`, in heartbeat, stall, timeout order
    pub fn tick(&mut self, now: Instant, progress: &ArtifactProgress) -> Vec<WatchEvent> {
        let elapsed = self.elapsed(now);
        let silent = self.silent(now);
        let mut events = Vec::new();

        if silent >= self.settings.heartbeat_interval && progress.compiled() > 0 {
            events.push(WatchEvent::Heartbeat {
                elapsed,
                artifacts: progress.compiled(),
                last_artifact: progress.last_artifact().to_string(),
            });
        }

        if silent >= self.settings.stall_timeout && !self.stall_warned {
            self.stall_warned = true;
            events.push(WatchEvent::Stall {
                silent,
                pid: self.pid,
            });
        }

        if elapsed >= self.settings.overall_timeout {
            events.push(WatchEvent::Timeout {
                limit: self.settings.overall_timeout,
            });
        }

        events
    }
}
