//! Standard libtest harness grammar

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::{truncate_detail, TestFailure, TestFormat, TestOutcome};

static RESULT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^test\s+(\S+)\s+\.\.\.\s+(ok|FAILED|ignored)").expect("Valid regex pattern")
});

static SUMMARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^test result:\s+(ok|FAILED)\.\s+(\d+)\s+passed;\s+(\d+)\s+failed;\s+(\d+)\s+ignored")
        .expect("Valid regex pattern")
});

static DETAIL_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---- (\S+) stdout ----$").expect("Valid regex pattern"));

const FAILURES_MARKER: &str = "failures:";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    passed: u32,
    failed: u32,
    ignored: u32,
}

impl Counts {
    fn add(&mut self, other: Counts) {
        self.passed = self.passed.saturating_add(other.passed);
        self.failed = self.failed.saturating_add(other.failed);
        self.ignored = self.ignored.saturating_add(other.ignored);
    }
}

#[derive(Debug, Default)]
struct Machine {
    counts: Counts,
    /// Incremental tallying stops at the first summary
    summarized: bool,
    recognized: bool,
    failed_names: Vec<String>,
    in_failures: bool,
    capturing: Option<String>,
    details: HashMap<String, Vec<String>>,
}

impl Machine {
    fn feed(&mut self, line: &str) {
        if let Some(caps) = RESULT_REGEX.captures(line) {
            self.recognized = true;
            let status = &caps[2];
            if !self.summarized {
                match status {
                    "ok" => self.counts.passed = self.counts.passed.saturating_add(1),
                    "FAILED" => self.counts.failed = self.counts.failed.saturating_add(1),
                    _ => self.counts.ignored = self.counts.ignored.saturating_add(1),
                }
            }
            if status == "FAILED" {
                self.failed_names.push(caps[1].to_string());
            }
            return;
        }

        if let Some(caps) = SUMMARY_REGEX.captures(line) {
            self.recognized = true;
            let parsed = Counts {
                passed: caps[2].parse().unwrap_or(0),
                failed: caps[3].parse().unwrap_or(0),
                ignored: caps[4].parse().unwrap_or(0),
            };
            if self.summarized {
                self.counts.add(parsed);
            } else {
                self.summarized = true;
                self.counts = parsed;
            }
            self.in_failures = false;
            self.capturing = None;
            return;
        }

        let trimmed = line.trim();
        if trimmed == FAILURES_MARKER {
            // libtest repeats the marker before listing names; stop capturing there
            self.in_failures = true;
            self.capturing = None;
            return;
        }
        if !self.in_failures {
            return;
        }

        if let Some(caps) = DETAIL_MARKER_REGEX.captures(trimmed) {
            let name = caps[1].to_string();
            self.details.insert(name.clone(), Vec::new());
            self.capturing = Some(name);
            return;
        }

        if let Some(name) = &self.capturing {
            if !trimmed.is_empty() && !trimmed.starts_with("----") {
                self.details
                    .entry(name.clone())
                    .or_default()
                    .push(trimmed.to_string());
            }
        }
    }

    fn finish(self) -> Option<TestOutcome> {
        if !self.recognized {
            return None;
        }
        let failures = self
            .failed_names
            .into_iter()
            .map(|name| {
                let error = self
                    .details
                    .get(&name)
                    .map(|lines| truncate_detail(lines))
                    .unwrap_or_default();
                TestFailure {
                    name,
                    step: None,
                    error,
                }
            })
            .collect();

        Some(TestOutcome {
            format: TestFormat::Standard,
            passed: self.counts.passed,
            failed: self.counts.failed,
            skipped: self.counts.ignored,
            failures,
        })
    }
}

/// Parse libtest output, `None` when no result or summary line appears
pub fn parse(lines: &[&str]) -> Option<TestOutcome> {
    let mut machine = Machine::default();
    for line in lines {
        machine.feed(line);
    }
    machine.finish()
}
