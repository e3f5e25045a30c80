//! Folding one run's diagnostics into the tracker state

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::types::{TrackStatus, TrackedDiagnostic, TrackerState};
use crate::cargo::{CompiledScope, DiagnosticEntry, DiagnosticKey};

/// Apply a run to `state` and return the keys that went from pending to fixed
///
/// A pending record whose key is missing from `current` becomes fixed only
/// when `scope` says its file was recompiled. Every current diagnostic ends
/// up pending: new keys get a fresh record, known keys take the current
/// message and line and lose their fixed timestamp.
pub fn apply_run(
    state: &mut TrackerState,
    current: &[DiagnosticEntry],
    project: &str,
    scope: &CompiledScope,
    now: DateTime<Utc>,
) -> Vec<DiagnosticKey> {
    state.project = project.to_string();
    state.last_run = Some(now);
    state.run_count += 1;

    let current_keys: HashSet<String> = current.iter().map(|d| d.key().to_string()).collect();

    let mut fixed = Vec::new();
    for (key, record) in state.diagnostics.iter_mut() {
        if record.is_pending() && !current_keys.contains(key) && scope.contains(&record.file) {
            record.status = TrackStatus::Fixed;
            record.fixed_at = Some(now);
            fixed.push(record.key());
        }
    }

    for entry in current {
        let key = entry.key().to_string();
        match state.diagnostics.get_mut(&key) {
            Some(record) => {
                record.status = TrackStatus::Pending;
                record.message = entry.message.clone();
                record.line = entry.line;
                record.fixed_at = None;
            }
            None => {
                state
                    .diagnostics
                    .insert(key, TrackedDiagnostic::first_seen(entry, now));
            }
        }
    }

    tracing::debug!(
        "Tracker run #{}: {} current, {} fixed",
        state.run_count,
        current.len(),
        fixed.len()
    );
    fixed
}
