/// Error code registry for cargo-diag
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Environment errors (project discovery)
/// - 3000-3999: Storage errors (tracker state, raw logs)
/// - 4000-4999: Execution errors (the supervised cargo process)
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_READ_FAILED: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;

    // Environment errors (2000-2999)
    pub const ENV_GENERIC: u16 = 2000;
    pub const ENV_NO_MANIFEST: u16 = 2001;
    pub const ENV_MANIFEST_UNREADABLE: u16 = 2002;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_SERIALIZATION_ERROR: u16 = 3002;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_SPAWN_FAILED: u16 = 4001;
    pub const EXEC_NO_OUTPUT: u16 = 4002;
    pub const EXEC_INTERRUPTED: u16 = 4003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "Configuration error",
        ErrorCode::CONFIG_READ_FAILED => "Configuration file could not be read",
        ErrorCode::CONFIG_INVALID_TOML => "Configuration file is not valid TOML",
        ErrorCode::CONFIG_INVALID_VALUE => "Configuration value out of range",

        ErrorCode::ENV_GENERIC => "Environment error",
        ErrorCode::ENV_NO_MANIFEST => "No Cargo.toml found",
        ErrorCode::ENV_MANIFEST_UNREADABLE => "Cargo.toml could not be read",

        ErrorCode::STORAGE_GENERIC => "Storage error",
        ErrorCode::STORAGE_IO_ERROR => "I/O error while accessing state",
        ErrorCode::STORAGE_SERIALIZATION_ERROR => "Failed to serialize tracker state",

        ErrorCode::EXEC_GENERIC => "Execution error",
        ErrorCode::EXEC_SPAWN_FAILED => "Failed to spawn the build tool",
        ErrorCode::EXEC_NO_OUTPUT => "Build tool failed without producing output",
        ErrorCode::EXEC_INTERRUPTED => "Run interrupted by a signal",

        _ => "Unknown error",
    }
}
