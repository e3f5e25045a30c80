//! Supervised execution of long-running build processes
//!
//! This module captures stdout and stderr line by line while watching the
//! child for silence. It prints heartbeats while the build is quiet but making
//! progress, warns once per silent period when it looks stuck, and kills the
//! child when the overall timeout is reached.

pub mod progress;
pub mod reporter;
pub mod runner;
pub mod types;
pub mod watchdog;

pub use progress::ArtifactProgress;
pub use reporter::{ProgressReporter, RecordingReporter, StderrReporter};
pub use runner::SupervisedRunner;
pub use types::{StreamSource, WatchEvent, WatchSettings};
pub use watchdog::Watchdog;
