//! Cargo invocation and its structured output
//!
//! - `command` builds the cargo command line for a run
//! - `message` models the `--message-format=json` records
//! - `diagnostic` turns compiler messages into deduplicated entries
//! - `scope` works out which directories a run recompiled

pub mod command;
pub mod diagnostic;
pub mod message;
pub mod scope;

pub use command::{CargoInvocation, CargoSubcommand};
pub use diagnostic::{
    count_hidden_warnings, decode_diagnostics, DiagnosticEntry, DiagnosticKey, Level, UNKNOWN_CODE,
};
pub use message::{split_output, CargoMessage, SplitOutput};
pub use scope::CompiledScope;
