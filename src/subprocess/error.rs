use crate::error::{DiagError, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture {0} of child process")]
    MissingPipe(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interrupted by signal {0}")]
    Interrupted(i32),
}

impl ProcessError {
    /// Classify a spawn failure, separating a missing program from other I/O errors
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        let command = command.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::CommandNotFound(command)
        } else {
            Self::Spawn { command, source }
        }
    }
}

/// A process that cannot even be started is reported like a launch failure
/// with no captured output.
impl From<ProcessError> for DiagError {
    fn from(err: ProcessError) -> Self {
        let message = err.to_string();
        match err {
            ProcessError::CommandNotFound(_) | ProcessError::Spawn { .. } => DiagError::Launch {
                code: ErrorCode::EXEC_SPAWN_FAILED,
                command: String::new(),
                exit_code: 127,
                stderr: message,
            },
            ProcessError::Interrupted(signal) => DiagError::interrupted(signal),
            _ => DiagError::Launch {
                code: ErrorCode::EXEC_GENERIC,
                command: String::new(),
                exit_code: 1,
                stderr: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_not_found_is_classified() {
        let err = ProcessError::spawn(
            "cargo check",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(err, ProcessError::CommandNotFound(ref c) if c == "cargo check"));

        let diag: DiagError = err.into();
        assert_eq!(diag.exit_code(), 127);
        assert_eq!(diag.code(), ErrorCode::EXEC_SPAWN_FAILED);
    }

    #[test]
    fn test_interrupt_is_not_a_launch_failure() {
        let diag: DiagError = ProcessError::Interrupted(15).into();
        assert!(matches!(diag, DiagError::Interrupted { signal: 15, .. }));
        assert_eq!(diag.exit_code(), 143);
    }

    #[test]
    fn test_spawn_other_io_error() {
        let err = ProcessError::spawn(
            "cargo",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert!(err.to_string().contains("denied"));
    }
}
