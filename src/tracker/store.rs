//! On-disk tracker file for one project

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::TrackerState;
use crate::error::{DiagError, DiagResult, ErrorCode};

const TRACKER_PREFIX: &str = "cargo-tracker-";

/// Loads and saves the tracker state of a single project
#[derive(Debug, Clone)]
pub struct TrackerStore {
    path: PathBuf,
}

impl TrackerStore {
    /// Store for `project` inside `state_dir`
    pub fn new(state_dir: &Path, project: &str) -> Self {
        let file_name = format!("{}{}.json", TRACKER_PREFIX, sanitize_name(project));
        Self {
            path: state_dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state
    ///
    /// A missing file is a first run. An unreadable or corrupt file is
    /// logged and replaced by an empty state on the next save.
    pub fn load(&self) -> TrackerState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return TrackerState::default(),
            Err(e) => {
                tracing::warn!("Cannot read tracker file {}: {}", self.path.display(), e);
                return TrackerState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Tracker file {} is corrupted, starting fresh: {}",
                    self.path.display(),
                    e
                );
                TrackerState::default()
            }
        }
    }

    /// Write the state through a temp file and rename it into place
    pub fn save(&self, state: &TrackerState) -> DiagResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error("create state directory", e))?;
        }

        let json = serde_json::to_string_pretty(state).map_err(|e| {
            DiagError::storage(
                ErrorCode::STORAGE_SERIALIZATION_ERROR,
                "Failed to serialize tracker state",
                Some(self.path.clone()),
            )
            .with_source(e)
        })?;

        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, json).map_err(|e| self.io_error("write temp tracker file", e))?;
        fs::rename(&temp_file, &self.path).map_err(|e| self.io_error("rename tracker file", e))?;

        tracing::debug!("Saved tracker state to {}", self.path.display());
        Ok(())
    }

    /// Delete the tracker file, returning whether one existed
    pub fn reset(&self) -> DiagResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Reset tracker {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error("remove tracker file", e)),
        }
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> DiagError {
        DiagError::storage(
            ErrorCode::STORAGE_IO_ERROR,
            format!("Failed to {}", action),
            Some(self.path.clone()),
        )
        .with_source(e)
    }
}

/// Keep only characters that are safe in a file name
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cargo::{CompiledScope, DiagnosticEntry, Level};
    use crate::tracker::apply_run;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_state() -> TrackerState {
        let mut state = TrackerState::default();
        let diags = [
            DiagnosticEntry {
                code: "E0432".to_string(),
                level: Level::Error,
                message: "unresolved import `crate::gone`".to_string(),
                file: "src/lib.rs".to_string(),
                line: 2,
                column: 5,
                suggestion: Some("crate::here".to_string()),
            },
            DiagnosticEntry {
                code: "unused_variables".to_string(),
                level: Level::Warning,
                message: "unused variable: `x`".to_string(),
                file: "src/main.rs".to_string(),
                line: 8,
                column: 9,
                suggestion: None,
            },
        ];
        apply_run(&mut state, &diags, "demo", &CompiledScope::Unrestricted, Utc::now());
        apply_run(&mut state, &diags[..1], "demo", &CompiledScope::Unrestricted, Utc::now());
        state
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store = TrackerStore::new(temp_dir.path(), "demo");
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load();

        assert_eq!(loaded, state);
        assert_eq!(loaded.run_count, 2);
        assert!(loaded.diagnostics["unused_variables::src/main.rs:8"].fixed_at.is_some());
        assert!(!temp_dir.path().join("cargo-tracker-demo.json.tmp").exists());
    }

    #[test]
    fn test_missing_and_corrupt_files_load_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = TrackerStore::new(temp_dir.path(), "demo");
        assert_eq!(store.load(), TrackerState::default());

        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), TrackerState::default());

        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().run_count, 2);
    }

    #[test]
    fn test_reset_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = TrackerStore::new(temp_dir.path(), "demo");
        assert!(!store.reset().unwrap());

        store.save(&sample_state()).unwrap();
        assert!(store.reset().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let store = TrackerStore::new(Path::new("/state"), "my crate/../x");
        assert_eq!(
            store.path(),
            Path::new("/state/cargo-tracker-my_crate____x.json")
        );
        assert_eq!(sanitize_name(""), "project");
    }
}
