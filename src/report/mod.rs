//! Plain-text report rendering
//!
//! The report is built for a reader who wants the shortest path to a green
//! build: progress first, then grouped diagnostics, then the order to fix them.

pub mod grouping;

use std::path::Path;

use crate::cargo::{CargoSubcommand, DiagnosticEntry, DiagnosticKey, Level};
use crate::test_output::TestOutcome;
use grouping::{format_grouped, plural, priority, sort_codes, tier_hint, truncate};

const FAILURE_DETAIL_LINES: usize = 5;
const FAILURE_LINE_WIDTH: usize = 120;

/// Facts about the run that are not diagnostics
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub command: CargoSubcommand,
    pub project: &'a str,
    pub run_number: u32,
    /// Local time, already formatted
    pub timestamp: String,
    pub include_warnings: bool,
    pub raw_log: &'a Path,
    pub tracker_file: &'a Path,
}

/// What one run found
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportData<'a> {
    pub diagnostics: &'a [DiagnosticEntry],
    /// Keys that went from pending to fixed in this run
    pub fixed: &'a [DiagnosticKey],
    /// Keys fixed by earlier runs, listed only on request
    pub earlier_fixed: &'a [DiagnosticKey],
    pub tests: Option<&'a TestOutcome>,
}

pub fn format_report(ctx: &ReportContext<'_>, data: &ReportData<'_>) -> String {
    let errors: Vec<&DiagnosticEntry> = data
        .diagnostics
        .iter()
        .filter(|d| d.level == Level::Error)
        .collect();
    let warnings: Vec<&DiagnosticEntry> = data
        .diagnostics
        .iter()
        .filter(|d| d.level == Level::Warning)
        .collect();
    let show_warnings = ctx.include_warnings && !warnings.is_empty();
    let failed_tests = data.tests.map_or(&[][..], |t| t.failures.as_slice());

    let mut out = vec![
        format!("=== CARGO DIAGNOSTICS: {} ===", ctx.command),
        format!(
            "Project: {} | Run #{} | {}",
            ctx.project, ctx.run_number, ctx.timestamp
        ),
        String::new(),
    ];

    out.push("--- PROGRESS ---".to_string());
    let fixed_note = if data.fixed.is_empty() {
        String::new()
    } else {
        format!(" ({} fixed since last run)", data.fixed.len())
    };
    if errors.is_empty() {
        out.push(format!("Errors: 0 remaining{} - ALL CLEAR!", fixed_note));
    } else {
        out.push(format!("Errors: {} remaining{}", errors.len(), fixed_note));
    }
    if show_warnings {
        out.push(format!("Warnings: {}", warnings.len()));
    }
    if let Some(tests) = data.tests {
        out.push(tests_line(tests));
    }
    out.push(String::new());

    let fixed_total = data.fixed.len() + data.earlier_fixed.len();
    if fixed_total > 0 {
        out.push(format!("--- FIXED ({}) ---", fixed_total));
        for key in data.fixed {
            out.push(format!("  [FIXED] {} {}", key.code, key.location()));
        }
        for key in data.earlier_fixed {
            out.push(format!("  [FIXED earlier] {} {}", key.code, key.location()));
        }
        out.push(String::new());
    }

    if !errors.is_empty() {
        out.push(format!("--- ERRORS ({}) ---", errors.len()));
        out.push(String::new());
        format_grouped(&mut out, &errors);
    }

    if show_warnings {
        out.push(format!("--- WARNINGS ({}) ---", warnings.len()));
        out.push(String::new());
        format_grouped(&mut out, &warnings);
    }

    let error_codes = sort_codes(errors.iter().map(|d| d.code.as_str()));
    if error_codes.len() > 1 {
        out.push("--- FIX ORDER ---".to_string());
        for (i, code) in error_codes.iter().enumerate() {
            let hits = errors.iter().filter(|d| d.code == *code).count();
            out.push(format!(
                "  {}. {} ({} hit{}) -> {}",
                i + 1,
                code,
                hits,
                plural(hits),
                tier_hint(priority(code))
            ));
        }
        out.push(String::new());
    }

    if !failed_tests.is_empty() {
        out.push(format!("--- FAILED TESTS ({}) ---", failed_tests.len()));
        out.push(String::new());
        for (i, failure) in failed_tests.iter().enumerate() {
            out.push(format!("  {}. {}", i + 1, failure.name));
            if let Some(step) = failure.step.as_deref().filter(|s| !s.is_empty()) {
                out.push(format!("     Step: {}", step));
            }
            for line in failure.error.lines().take(FAILURE_DETAIL_LINES) {
                out.push(format!("     {}", truncate(line, FAILURE_LINE_WIDTH)));
            }
            out.push(String::new());
        }
    }

    if errors.is_empty() && !show_warnings && failed_tests.is_empty() {
        out.push("No issues found. Build is clean!".to_string());
        out.push(String::new());
    }

    out.push(format!("Raw log: {}", ctx.raw_log.display()));
    out.push(format!("Tracker: {}", ctx.tracker_file.display()));

    out.join("\n")
}

fn tests_line(tests: &TestOutcome) -> String {
    if tests.failed > 0 {
        format!(
            "Tests: {} FAILED, {} passed, {} skipped (total: {})",
            tests.failed,
            tests.passed,
            tests.skipped,
            tests.total()
        )
    } else {
        format!(
            "Tests: ALL PASSED ({} passed, {} skipped, total: {})",
            tests.passed,
            tests.skipped,
            tests.total()
        )
    }
}

/// Trailer noting warnings left out of the report
pub fn hidden_warnings_note(count: usize) -> Option<String> {
    (count > 0).then(|| {
        format!(
            "(Hiding {} warnings. Use --include-warnings to see them.)",
            count
        )
    })
}
