use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The application error type for cargo-diag
///
/// `Environment`, `Launch` and `Interrupted` end a run. Storage problems are
/// logged by the session and the report is still produced.
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Environment {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] cargo {command} failed with exit code {exit_code}")]
    Launch {
        code: u16,
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("[E{code:04}] Interrupted by signal {signal}")]
    Interrupted { code: u16, signal: i32 },
}

impl DiagError {
    /// Create a configuration error for a specific file
    pub fn config(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// No buildable project could be located
    pub fn no_manifest(start: impl Into<PathBuf>) -> Self {
        Self::Environment {
            code: ErrorCode::ENV_NO_MANIFEST,
            message: "No Cargo.toml found".to_string(),
            path: Some(start.into()),
            source: None,
        }
    }

    /// Create an environment error with specific code
    pub fn environment(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Environment {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a storage error with specific code and path
    pub fn storage(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// The build tool exited non-zero without writing anything to stdout
    pub fn launch(command: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::Launch {
            code: ErrorCode::EXEC_NO_OUTPUT,
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// The run was stopped by SIGINT or SIGTERM
    pub fn interrupted(signal: i32) -> Self {
        Self::Interrupted {
            code: ErrorCode::EXEC_INTERRUPTED,
            signal,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Environment { source: src, .. }
            | Self::Storage { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::Launch { .. } | Self::Interrupted { .. } => {}
        }
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Environment { .. } => 1,
            Self::Storage { .. } => 4,
            Self::Launch { exit_code, .. } => *exit_code,
            // shell convention for death by signal
            Self::Interrupted { signal, .. } => 128 + signal,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Environment { code, .. }
            | Self::Storage { code, .. }
            | Self::Launch { code, .. }
            | Self::Interrupted { code, .. } => *code,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, path, .. } => match path {
                Some(p) => format!("Configuration problem in {}: {}", p.display(), message),
                None => format!("Configuration problem: {}", message),
            },
            Self::Environment { message, path, .. } => match path {
                Some(p) => format!("ERROR: {} (searched from {})", message, p.display()),
                None => format!("ERROR: {}", message),
            },
            Self::Storage { message, path, .. } => match path {
                Some(p) => format!("Storage error at {}: {}", p.display(), message),
                None => format!("Storage error: {}", message),
            },
            Self::Launch {
                command,
                exit_code,
                stderr,
                ..
            } => format!(
                "=== CARGO FAILED ===\nCommand: cargo {}\nExit code: {}\nstderr:\n{}",
                command, exit_code, stderr
            ),
            Self::Interrupted { .. } => "Interrupted; cargo was stopped".to_string(),
        }
    }

    /// Whether this error is printed on stdout in place of the report
    pub fn replaces_report(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}

/// Result type alias using DiagError
pub type DiagResult<T> = std::result::Result<T, DiagError>;
