//! # cargo-diag
//!
//! Runs a cargo command under a watchdog and condenses its output into a
//! short, grouped report that remembers what was fixed since the last run.
//!
//! ## Usage
//!
//! ```bash
//! cargo diag check [-p crate] [--include-warnings] [--show-fixed] [--fresh]
//! cargo diag test [--compile-only] [--manifest-path path/to/Cargo.toml]
//! ```
//!
//! ## Modules
//!
//! - `subprocess` - Process runner abstraction and the supervised cargo runner
//! - `cargo` - Cargo command line, JSON message stream and diagnostic decoding
//! - `test_output` - Test harness output parsing (libtest and cucumber)
//! - `tracker` - Cross-run diagnostic tracking persisted as JSON
//! - `report` - Plain-text report rendering
//! - `session` - One invocation from cargo launch to report
//! - `project` - Workspace discovery and project identity
//! - `config` - Layered configuration
//! - `error` - Error types and codes
pub mod cargo;
pub mod config;
pub mod error;
pub mod project;
pub mod report;
pub mod session;
pub mod subprocess;
pub mod test_output;
pub mod tracker;
