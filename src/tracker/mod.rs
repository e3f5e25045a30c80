//! Cross-run diagnostic tracking
//!
//! Each project keeps one JSON file mapping diagnostic identity to its
//! status. A run loads it, folds the current diagnostics in with
//! [`apply_run`], and writes it back, yielding the diagnostics fixed since the
//! previous run.
//!
//! ```
//! use cargo_diag::cargo::CompiledScope;
//! use cargo_diag::tracker::{apply_run, TrackerStore};
//!
//! # fn example() -> cargo_diag::error::DiagResult<()> {
//! let store = TrackerStore::new(&std::env::temp_dir(), "my-project");
//! let mut state = store.load();
//! let fixed = apply_run(&mut state, &[], "my-project", &CompiledScope::Unrestricted, chrono::Utc::now());
//! println!("{} fixed since last run", fixed.len());
//! store.save(&state)?;
//! # Ok(())
//! # }
//! ```

pub mod merge;
pub mod store;
pub mod types;

pub use merge::apply_run;
pub use store::{sanitize_name, TrackerStore};
pub use types::{TrackStatus, TrackedDiagnostic, TrackerState};
