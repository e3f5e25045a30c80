use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ProcessError;

/// Sentinel exit code reported when the overall timeout killed the child
pub const TIMEOUT_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessCommand {
    /// Render the command line for logs and error messages
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// Captured stdout, one line per captured line, joined with `\n`
    pub stdout: String,
    /// Captured stderr, joined with `\n`
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Exit code as the rest of the pipeline sees it (`-1` on timeout)
    pub fn exit_code(&self) -> i32 {
        self.status.raw_code()
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.status, ExitStatus::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Timeout,
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            _ => None,
        }
    }

    /// Flatten to a single integer: timeouts report `-1`, signals `-signal`
    pub fn raw_code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Error(code) => *code,
            ExitStatus::Timeout => TIMEOUT_EXIT_CODE,
            ExitStatus::Signal(sig) => -sig,
        }
    }

    /// Convert a std ExitStatus to our ExitStatus enum
    pub fn from_std(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        if let Some(code) = status.code() {
            return ExitStatus::Error(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ExitStatus::Signal(sig);
            }
        }
        ExitStatus::Error(-1)
    }
}

/// ExitStatusHelper for creating exit statuses
pub struct ExitStatusHelper;

impl ExitStatusHelper {
    /// Create a success exit status
    pub fn success() -> ExitStatus {
        ExitStatus::Success
    }

    /// Create a failure exit status with code
    pub fn failure(code: i32) -> ExitStatus {
        if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion (or until it is killed) and capture its output
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_code_sentinels() {
        assert_eq!(ExitStatus::Success.raw_code(), 0);
        assert_eq!(ExitStatus::Error(101).raw_code(), 101);
        assert_eq!(ExitStatus::Timeout.raw_code(), TIMEOUT_EXIT_CODE);
        assert_eq!(ExitStatus::Signal(9).raw_code(), -9);
        assert_eq!(ExitStatus::Timeout.code(), None);
    }

    #[test]
    fn test_failure_helper_normalizes_zero() {
        assert!(ExitStatusHelper::failure(0).success());
        assert_eq!(ExitStatusHelper::failure(2), ExitStatus::Error(2));
    }

    #[test]
    fn test_display_command() {
        let cmd = ProcessCommand {
            program: "cargo".to_string(),
            args: vec!["check".to_string(), "--tests".to_string()],
            env: HashMap::new(),
            working_dir: None,
        };
        assert_eq!(cmd.display(), "cargo check --tests");
    }
}
