//! Persisted tracker records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cargo::{DiagnosticEntry, DiagnosticKey, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Pending,
    Fixed,
}

/// A diagnostic remembered across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedDiagnostic {
    pub code: String,
    pub level: Level,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub suggestion: Option<String>,
    pub status: TrackStatus,
    pub first_seen: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_at: Option<DateTime<Utc>>,
}

impl TrackedDiagnostic {
    /// A new pending record for a diagnostic seen for the first time
    #[must_use]
    pub fn first_seen(entry: &DiagnosticEntry, now: DateTime<Utc>) -> Self {
        Self {
            code: entry.code.clone(),
            level: entry.level,
            message: entry.message.clone(),
            file: entry.file.clone(),
            line: entry.line,
            suggestion: entry.suggestion.clone(),
            status: TrackStatus::Pending,
            first_seen: now,
            fixed_at: None,
        }
    }

    pub fn key(&self) -> DiagnosticKey {
        DiagnosticKey::new(self.code.clone(), self.file.clone(), self.line)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TrackStatus::Pending
    }
}

/// Everything the tracker remembers about one project
///
/// Records are keyed by the `code::file:line` rendering of their identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerState {
    pub project: String,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u32,
    pub diagnostics: BTreeMap<String, TrackedDiagnostic>,
}

impl TrackerState {
    pub fn pending(&self) -> impl Iterator<Item = &TrackedDiagnostic> {
        self.diagnostics.values().filter(|d| d.is_pending())
    }
}
