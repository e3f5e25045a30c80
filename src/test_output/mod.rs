//! Test-harness output parsing
//!
//! Two report grammars are recognized independently over the same lines:
//! behaviour-style (cucumber) reports and the standard libtest harness. Each
//! grammar is a pure state machine returning `None` when it saw nothing it
//! recognizes. When both match, their results are added together.

pub mod cucumber;
pub mod harness;

use serde::Serialize;

/// Lines of failure detail kept per failure
pub const MAX_DETAIL_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFormat {
    Cucumber,
    Standard,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFailure {
    pub name: String,
    /// Step that failed, for behaviour-style reports
    pub step: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub format: TestFormat,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub failures: Vec<TestFailure>,
}

impl TestOutcome {
    pub fn new(format: TestFormat) -> Self {
        Self {
            format,
            passed: 0,
            failed: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn total(&self) -> u32 {
        self.passed
            .saturating_add(self.failed)
            .saturating_add(self.skipped)
    }

    /// Add another sub-run's counts and failures to this one
    pub fn absorb(&mut self, other: TestOutcome) {
        self.passed = self.passed.saturating_add(other.passed);
        self.failed = self.failed.saturating_add(other.failed);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.failures.extend(other.failures);
    }
}

/// Parse free-text stdout lines followed by stderr
///
/// Returns `None` when no test output was detected, which is normal for a
/// run that only compiled.
pub fn parse_test_output(text_lines: &[&str], stderr: &str) -> Option<TestOutcome> {
    let lines: Vec<&str> = text_lines
        .iter()
        .copied()
        .chain(stderr.lines())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let behaviour = cucumber::parse(&lines);
    let standard = harness::parse(&lines);

    match (behaviour, standard) {
        (Some(mut behaviour), Some(standard)) => {
            behaviour.format = TestFormat::Mixed;
            behaviour.absorb(standard);
            Some(behaviour)
        }
        (Some(outcome), None) | (None, Some(outcome)) => Some(outcome),
        (None, None) => None,
    }
}

/// Keep the first few detail lines and note how many were dropped
pub(crate) fn truncate_detail(lines: &[String]) -> String {
    let mut text = lines
        .iter()
        .take(MAX_DETAIL_LINES)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    if lines.len() > MAX_DETAIL_LINES {
        text.push_str(&format!(
            "\n  ... ({} more lines)",
            lines.len() - MAX_DETAIL_LINES
        ));
    }
    text
}
