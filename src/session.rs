//! One cargo-diag invocation from cargo launch to finished report

use chrono::{DateTime, Local, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cargo::{
    count_hidden_warnings, decode_diagnostics, split_output, CargoInvocation, CargoSubcommand,
    CompiledScope, DiagnosticEntry, DiagnosticKey,
};
use crate::config::DiagConfig;
use crate::error::{DiagError, DiagResult, ErrorCode};
use crate::project::Project;
use crate::report::{format_report, hidden_warnings_note, ReportContext, ReportData};
use crate::subprocess::{ProcessError, ProcessOutput, SubprocessManager};
use crate::test_output::{parse_test_output, TestOutcome};
use crate::tracker::{apply_run, TrackStatus, TrackerStore};

const RAW_LOG_PREFIX: &str = "cargo-diag-raw-";
const STDERR_SEPARATOR: &str = "\n---STDERR---\n";

/// What the user asked for on the command line
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub command: CargoSubcommand,
    pub include_warnings: bool,
    pub package: Option<String>,
    pub reset_tracker: bool,
    pub show_fixed: bool,
    pub fresh: bool,
    pub compile_only: bool,
}

impl SessionOptions {
    pub fn new(command: CargoSubcommand) -> Self {
        Self {
            command,
            include_warnings: false,
            package: None,
            reset_tracker: false,
            show_fixed: false,
            fresh: false,
            compile_only: false,
        }
    }
}

/// Everything one invocation produced
#[derive(Debug, Clone)]
pub struct RunSession {
    pub command: CargoSubcommand,
    pub package: Option<String>,
    pub output: ProcessOutput,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub tests: Option<TestOutcome>,
    pub fixed: Vec<DiagnosticKey>,
    pub hidden_warnings: usize,
    pub raw_log: PathBuf,
    pub tracker_file: PathBuf,
    pub report: String,
}

/// Runs cargo for a project and turns the result into a report
pub struct Session {
    project: Project,
    config: DiagConfig,
    subprocess: SubprocessManager,
}

impl Session {
    pub fn new(project: Project, config: DiagConfig, subprocess: SubprocessManager) -> Self {
        Self {
            project,
            config,
            subprocess,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub async fn run(&self, options: &SessionOptions) -> DiagResult<RunSession> {
        self.run_at(options, Utc::now()).await
    }

    /// Run with an explicit clock reading
    ///
    /// Fails only when cargo could not be started, was interrupted, or exited
    /// non-zero without printing anything. Tracker and log problems are logged
    /// and skipped.
    pub async fn run_at(
        &self,
        options: &SessionOptions,
        now: DateTime<Utc>,
    ) -> DiagResult<RunSession> {
        let invocation = CargoInvocation::new(options.command)
            .program(self.config.cargo.as_str())
            .package(options.package.clone())
            .manifest_path(self.project.manifest_path.clone())
            .compile_only(options.compile_only);
        let store = TrackerStore::new(&self.config.state_dir, &self.project.name);

        if options.reset_tracker {
            if let Err(e) = store.reset() {
                tracing::warn!("Could not reset tracker: {}", e);
            }
        }

        if options.fresh {
            self.clean(&invocation).await;
        }

        let command = invocation.to_command(&self.project.root);
        tracing::debug!("Running {}", command.display());
        let output = self
            .subprocess
            .runner()
            .run(command)
            .await
            .map_err(|e| spawn_failure(options.command, e))?;

        let local_now = now.with_timezone(&Local);
        let raw_log = raw_log_path(&self.config.log_dir, &local_now);
        if let Err(e) = write_raw_log(&raw_log, &output) {
            tracing::warn!("{}", e);
        }

        if !output.status.success() && output.stdout.trim().is_empty() {
            return Err(DiagError::launch(
                options.command.as_str(),
                output.exit_code(),
                output.stderr,
            ));
        }

        let split = split_output(&output.stdout);
        let diagnostics = decode_diagnostics(
            split.structured.iter().copied(),
            options.include_warnings,
        );

        let tests = if invocation.runs_tests() {
            parse_test_output(&split.text, &output.stderr)
        } else {
            None
        };

        let scope = match options.package {
            Some(_) => CompiledScope::from_stream(
                split.structured.iter().copied(),
                Some(self.project.root.as_path()),
            ),
            None => CompiledScope::Unrestricted,
        };

        let mut state = store.load();
        let fixed = apply_run(&mut state, &diagnostics, &self.project.name, &scope, now);
        if let Err(e) = store.save(&state) {
            tracing::warn!("Could not save tracker: {}", e);
        }

        let earlier_fixed: Vec<DiagnosticKey> = if options.show_fixed {
            state
                .diagnostics
                .values()
                .filter(|d| d.status == TrackStatus::Fixed)
                .map(|d| d.key())
                .filter(|key| !fixed.contains(key))
                .collect()
        } else {
            Vec::new()
        };

        let hidden_warnings = if options.include_warnings {
            0
        } else {
            count_hidden_warnings(split.structured.iter().copied())
        };

        let ctx = ReportContext {
            command: options.command,
            project: &self.project.name,
            run_number: state.run_count,
            timestamp: local_now.format("%Y-%m-%d %H:%M").to_string(),
            include_warnings: options.include_warnings,
            raw_log: &raw_log,
            tracker_file: store.path(),
        };
        let mut report = format_report(
            &ctx,
            &ReportData {
                diagnostics: &diagnostics,
                fixed: &fixed,
                earlier_fixed: &earlier_fixed,
                tests: tests.as_ref(),
            },
        );
        if let Some(note) = hidden_warnings_note(hidden_warnings) {
            report.push_str("\n\n");
            report.push_str(&note);
        }

        Ok(RunSession {
            command: options.command,
            package: options.package.clone(),
            output,
            diagnostics,
            tests,
            fixed,
            hidden_warnings,
            raw_log,
            tracker_file: store.path().to_path_buf(),
            report,
        })
    }

    /// `cargo clean` before the run; failures are only logged
    async fn clean(&self, invocation: &CargoInvocation) {
        let command = invocation.clean_command(&self.project.root);
        match self.subprocess.runner().run(command).await {
            Ok(output) if output.status.success() => tracing::info!("Cleaned build artifacts"),
            Ok(output) => tracing::warn!(
                "cargo clean exited with {}: {}",
                output.exit_code(),
                output.stderr.trim()
            ),
            Err(e) => tracing::warn!("cargo clean failed: {}", e),
        }
    }
}

fn spawn_failure(command: CargoSubcommand, err: ProcessError) -> DiagError {
    match DiagError::from(err) {
        DiagError::Launch {
            code,
            exit_code,
            stderr,
            ..
        } => DiagError::Launch {
            code,
            command: command.to_string(),
            exit_code,
            stderr,
        },
        other => other,
    }
}

pub fn raw_log_path(log_dir: &Path, now: &DateTime<Local>) -> PathBuf {
    log_dir.join(format!(
        "{}{}.log",
        RAW_LOG_PREFIX,
        now.format("%Y%m%d-%H%M%S")
    ))
}

fn write_raw_log(path: &Path, output: &ProcessOutput) -> DiagResult<()> {
    let contents = format!("{}{}{}", output.stdout, STDERR_SEPARATOR, output.stderr);
    fs::write(path, contents).map_err(|e| {
        DiagError::storage(
            ErrorCode::STORAGE_IO_ERROR,
            "Failed to write raw log",
            Some(path.to_path_buf()),
        )
        .with_source(e)
    })
}
