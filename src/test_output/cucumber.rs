//! Behaviour-style (cucumber) report grammar
//!
//! ```
//! use cargo_diag::test_output::cucumber;
//!
//! let lines = [
//!     "Feature: Checkout",
//!     "  Scenario: empty cart",
//!     "    ✔ Given an empty cart",
//!     "    ✘ When I pay",
//!     "      step panicked",
//!     "1 scenario (1 failed)",
//! ];
//! let outcome = cucumber::parse(&lines).unwrap();
//! assert_eq!(outcome.failed, 1);
//! assert_eq!(outcome.failures[0].name, "[Checkout] empty cart");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::{truncate_detail, TestFailure, TestFormat, TestOutcome};

static FEATURE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*Feature:\s*(.+)").expect("Valid regex pattern"));

static SCENARIO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*Scenario(?:\s+Outline)?:\s*(.+)").expect("Valid regex pattern")
});

static STEP_PASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[✔✓]\s+(Given|When|Then|And|But)\s+(.+)").expect("Valid regex pattern")
});

static STEP_FAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[✘✗×]\s+(Given|When|Then|And|But)\s+(.+)").expect("Valid regex pattern")
});

/// Terminals without unicode markers print a `[failed]` suffix instead
static STEP_FAIL_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(Given|When|Then|And|But)\s+(.+)\s+\[failed\]")
        .expect("Valid regex pattern")
});

static STEP_SKIP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[?\-]\s+(Given|When|Then|And|But)\s+(.+)").expect("Valid regex pattern")
});

static SUMMARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)\s+scenarios?\s*\(([^)]+)\)").expect("Valid regex pattern")
});

static SUMMARY_PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+(\w+)").expect("Valid regex pattern"));

/// One classified input line
#[derive(Debug, PartialEq)]
enum Line<'a> {
    Feature(&'a str),
    Scenario(&'a str),
    StepPassed(String),
    StepFailed(String),
    StepSkipped,
    Summary(&'a str),
    Text(&'a str),
}

fn step_label(caps: &regex::Captures<'_>) -> String {
    format!("{} {}", &caps[1], &caps[2])
}

fn classify(line: &str) -> Line<'_> {
    if let Some(caps) = FEATURE_REGEX.captures(line) {
        return Line::Feature(caps.get(1).map_or("", |m| m.as_str()).trim());
    }
    if let Some(caps) = SCENARIO_REGEX.captures(line) {
        return Line::Scenario(caps.get(1).map_or("", |m| m.as_str()).trim());
    }
    if let Some(caps) = STEP_PASS_REGEX.captures(line) {
        return Line::StepPassed(step_label(&caps));
    }
    if let Some(caps) = STEP_FAIL_REGEX
        .captures(line)
        .or_else(|| STEP_FAIL_SUFFIX_REGEX.captures(line))
    {
        return Line::StepFailed(step_label(&caps));
    }
    if STEP_SKIP_REGEX.is_match(line) {
        return Line::StepSkipped;
    }
    if let Some(caps) = SUMMARY_REGEX.captures(line) {
        return Line::Summary(caps.get(2).map_or("", |m| m.as_str()));
    }
    Line::Text(line)
}

#[derive(Debug, Default)]
struct Machine {
    feature: String,
    scenario: String,
    step: String,
    in_failure: bool,
    detail: Vec<String>,
    /// A feature, scenario or summary line was seen
    recognized: bool,
    passed: u32,
    failed: u32,
    skipped: u32,
    failures: Vec<TestFailure>,
}

impl Machine {
    fn feed(&mut self, line: &str) {
        match classify(line) {
            Line::Feature(name) => {
                self.close_scenario_failure();
                self.feature = name.to_string();
                self.recognized = true;
            }
            Line::Scenario(name) => {
                self.close_scenario_failure();
                self.scenario = name.to_string();
                self.recognized = true;
            }
            Line::StepPassed(label) => {
                self.close_failure();
                self.step = label;
            }
            Line::StepFailed(label) => {
                self.close_failure();
                self.step = label;
                self.in_failure = true;
                self.failed = self.failed.saturating_add(1);
            }
            Line::StepSkipped => {
                self.close_failure();
                self.skipped = self.skipped.saturating_add(1);
            }
            Line::Summary(breakdown) => {
                self.apply_summary(breakdown);
                self.recognized = true;
            }
            Line::Text(text) => {
                let text = text.trim();
                if self.in_failure && !text.is_empty() {
                    self.detail.push(text.to_string());
                }
            }
        }
    }

    /// The summary's breakdown replaces whatever was tallied so far
    fn apply_summary(&mut self, breakdown: &str) {
        for part in breakdown.split(',') {
            let Some(caps) = SUMMARY_PART_REGEX.captures(part.trim()) else {
                continue;
            };
            let Ok(count) = caps[1].parse::<u32>() else {
                continue;
            };
            match caps[2].to_lowercase().as_str() {
                "passed" => self.passed = count,
                "failed" => self.failed = count,
                "skipped" | "pending" => self.skipped = count,
                _ => {}
            }
        }
    }

    /// Close an open failure only once a scenario has been named
    fn close_scenario_failure(&mut self) {
        if self.in_failure && !self.scenario.is_empty() {
            self.close_failure();
        }
    }

    fn close_failure(&mut self) {
        if !self.in_failure {
            return;
        }
        let name = if self.feature.is_empty() {
            self.scenario.clone()
        } else {
            format!("[{}] {}", self.feature, self.scenario)
        };
        self.failures.push(TestFailure {
            name,
            step: Some(self.step.clone()),
            error: truncate_detail(&self.detail),
        });
        self.detail.clear();
        self.in_failure = false;
    }

    fn finish(mut self) -> Option<TestOutcome> {
        self.close_scenario_failure();
        if !self.recognized {
            return None;
        }
        Some(TestOutcome {
            format: TestFormat::Cucumber,
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            failures: self.failures,
        })
    }
}

/// Parse a behaviour-style report, `None` when no feature, scenario or
/// summary line appears
pub fn parse(lines: &[&str]) -> Option<TestOutcome> {
    let mut machine = Machine::default();
    for line in lines {
        machine.feed(line);
    }
    machine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_overrides_step_tallies() {
        let lines = [
            "Feature: F",
            "  Scenario: S",
            "    ✔ Given a thing",
            "    ✘ When it breaks",
            "2 scenarios (1 passed, 1 failed)",
        ];

        let outcome = parse(&lines).unwrap();
        assert_eq!(outcome.format, TestFormat::Cucumber);
        assert_eq!(outcome.passed, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "[F] S");
        assert_eq!(outcome.failures[0].step.as_deref(), Some("When it breaks"));
    }

    #[test]
    fn test_failure_at_end_of_feature_keeps_its_feature() {
        let lines = [
            "Feature: Login",
            "  Scenario: bad password",
            "    ✘ Then access is denied",
            "      expected 401, got 500",
            "Feature: Logout",
            "  Scenario: session ends",
            "    ✔ Then the cookie is gone",
            "2 scenarios (1 passed, 1 failed)",
        ];

        let outcome = parse(&lines).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "[Login] bad password");
        assert_eq!(outcome.failures[0].step.as_deref(), Some("Then access is denied"));
        assert_eq!(outcome.failures[0].error, "expected 401, got 500");
    }

    #[test]
    fn test_failure_detail_is_truncated() {
        let mut lines = vec!["Feature: Big", "Scenario: noisy", "✗ Then it fails"];
        let detail: Vec<String> = (1..=8).map(|i| format!("  detail {}", i)).collect();
        lines.extend(detail.iter().map(String::as_str));
        lines.push("");
        lines.push("Scenario: next");

        let outcome = parse(&lines).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(
            outcome.failures[0].error,
            "detail 1\ndetail 2\ndetail 3\ndetail 4\ndetail 5\n  ... (3 more lines)"
        );
        assert_eq!(outcome.failed, 1);
    }

    #[test]
    fn test_failed_suffix_and_skips() {
        let lines = [
            "Feature: Alt",
            "Scenario Outline: markers",
            "  When the terminal is plain [failed]",
            "  boom",
            "  - Then it is skipped",
            "  ? And so is this",
        ];

        let outcome = parse(&lines).unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.failures[0].error, "boom");
        assert_eq!(outcome.failures[0].name, "[Alt] markers");
    }

    #[test]
    fn test_pending_counts_as_skipped() {
        let outcome = parse(&["3 scenarios (1 passed, 2 pending)"]).unwrap();
        assert_eq!(outcome.passed, 1);
        assert_eq!(outcome.skipped, 2);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_step_lines_alone_do_not_match() {
        assert!(parse(&["✔ Given something", "✘ When another"]).is_none());
        assert!(parse(&["test foo ... ok"]).is_none());
    }
}
