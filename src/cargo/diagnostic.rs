//! Decoding compiler diagnostics out of the structured stream

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::message::{CargoMessage, DiagnosticSpan, RustcDiagnostic};

/// Code recorded for diagnostics that carry none
pub const UNKNOWN_CODE: &str = "E????";

/// Text of the trailing summary rustc prints after failing a crate
const ABORT_SUMMARY: &str = "aborting due to";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }
}

/// Identity of a diagnostic within and across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagnosticKey {
    pub code: String,
    pub file: String,
    pub line: u32,
}

impl DiagnosticKey {
    pub fn new(code: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            code: code.into(),
            file: file.into(),
            line,
        }
    }

    /// `file:line`
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

impl fmt::Display for DiagnosticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}:{}", self.code, self.file, self.line)
    }
}

/// One compiler-reported issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub code: String,
    pub level: Level,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub suggestion: Option<String>,
}

impl DiagnosticEntry {
    pub fn key(&self) -> DiagnosticKey {
        DiagnosticKey::new(self.code.clone(), self.file.clone(), self.line)
    }

    /// Build an entry from a raw diagnostic, or `None` when it has no location
    fn from_rustc(diag: &RustcDiagnostic, level: Level) -> Option<Self> {
        let span = primary_span(&diag.spans)?;
        Some(Self {
            code: diag.code_str().unwrap_or(UNKNOWN_CODE).to_string(),
            level,
            message: diag.message.clone(),
            file: span.file_name.clone(),
            line: span.line_start,
            column: span.column_start,
            suggestion: extract_suggestion(diag),
        })
    }
}

/// The span marked primary, else the first one
fn primary_span(spans: &[DiagnosticSpan]) -> Option<&DiagnosticSpan> {
    spans.iter().find(|s| s.is_primary).or_else(|| spans.first())
}

/// First `help` child with a replacement on one of its spans, or else a message
fn extract_suggestion(diag: &RustcDiagnostic) -> Option<String> {
    for child in diag.children.iter().filter(|c| c.level == "help") {
        let replacement = child
            .spans
            .iter()
            .filter_map(|s| s.suggested_replacement.as_deref())
            .map(str::trim)
            .find(|r| !r.is_empty());
        if let Some(replacement) = replacement {
            return Some(replacement.to_string());
        }
        if !child.message.is_empty() {
            return Some(child.message.clone());
        }
    }
    None
}

fn wanted_level(level: &str, include_warnings: bool) -> Option<Level> {
    match level {
        "error" => Some(Level::Error),
        "warning" if include_warnings => Some(Level::Warning),
        _ => None,
    }
}

/// Decode every compiler diagnostic in `lines`, first occurrence per key wins
pub fn decode_diagnostics<'a, I>(lines: I, include_warnings: bool) -> Vec<DiagnosticEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for line in lines {
        let Some(CargoMessage::CompilerMessage(record)) = CargoMessage::parse(line) else {
            continue;
        };
        let diag = &record.message;

        let Some(level) = wanted_level(&diag.level, include_warnings) else {
            continue;
        };
        if diag.code_str().is_none() && diag.message.contains(ABORT_SUMMARY) {
            continue;
        }
        let Some(entry) = DiagnosticEntry::from_rustc(diag, level) else {
            continue;
        };

        if seen.insert(entry.key()) {
            entries.push(entry);
        }
    }

    tracing::debug!("Decoded {} diagnostics", entries.len());
    entries
}

/// Warnings with a code that a run without `--include-warnings` leaves out
pub fn count_hidden_warnings<'a, I>(lines: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter_map(CargoMessage::parse)
        .filter(|msg| match msg {
            CargoMessage::CompilerMessage(record) => {
                record.message.level == "warning" && record.message.code_str().is_some()
            }
            _ => false,
        })
        .count()
}
