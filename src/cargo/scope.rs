//! Which source directories a run actually recompiled
//!
//! A run scoped with `-p` only re-diagnoses the packages it rebuilt. Tracked
//! diagnostics in other directories must not be reported as fixed just
//! because they were not looked at.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use super::message::CargoMessage;

/// Directory used for crates grouped under a shared folder (`crates/<name>`)
const GROUPED_PACKAGE_DIR: &str = "crates";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledScope {
    /// Every file is eligible to be marked fixed
    Unrestricted,
    /// Only files under these directory prefixes are eligible
    Restricted(BTreeSet<String>),
}

impl CompiledScope {
    /// Collect rebuilt directories from artifact records and diagnostic spans
    ///
    /// Artifact source paths are absolute; they are made relative to
    /// `workspace_root` and dropped when they live outside it.
    pub fn from_stream<'a, I>(lines: I, workspace_root: Option<&Path>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dirs = BTreeSet::new();

        for line in lines {
            match CargoMessage::parse(line) {
                Some(CargoMessage::CompilerArtifact(artifact)) if !artifact.fresh => {
                    let src = Path::new(&artifact.target.src_path);
                    let relative = match workspace_root {
                        Some(root) => src.strip_prefix(root).ok(),
                        None => None,
                    };
                    if let Some(prefix) = relative.and_then(dir_prefix) {
                        dirs.insert(prefix);
                    }
                }
                Some(CargoMessage::CompilerMessage(record)) => {
                    for span in &record.message.spans {
                        let file = Path::new(&span.file_name);
                        if file.is_absolute() {
                            continue;
                        }
                        if let Some(prefix) = dir_prefix(file) {
                            dirs.insert(prefix);
                        }
                    }
                }
                _ => {}
            }
        }

        tracing::debug!("Compiled scope: {:?}", dirs);
        CompiledScope::Restricted(dirs)
    }

    /// Whether a diagnostic in `file` was re-examined by this run
    pub fn contains(&self, file: &str) -> bool {
        match self {
            CompiledScope::Unrestricted => true,
            CompiledScope::Restricted(dirs) => match dir_prefix(Path::new(file)) {
                Some(prefix) => dirs.contains(&prefix),
                None => true,
            },
        }
    }
}

/// Top-level directory of a relative path, or two levels under `crates/`
///
/// Paths with fewer than two components have no prefix.
pub fn dir_prefix(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    match parts.as_slice() {
        [GROUPED_PACKAGE_DIR, name, _, ..] => Some(format!("{}/{}", GROUPED_PACKAGE_DIR, name)),
        [first, _, ..] => Some((*first).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix(Path::new("backend/src/main.rs")).as_deref(), Some("backend"));
        assert_eq!(
            dir_prefix(Path::new("crates/core/src/lib.rs")).as_deref(),
            Some("crates/core")
        );
        assert_eq!(dir_prefix(Path::new("crates/README")).as_deref(), Some("crates"));
        assert_eq!(dir_prefix(Path::new("build.rs")), None);
    }

    #[test]
    fn test_scope_from_artifacts_and_spans() {
        let lines = [
            r#"{"reason":"compiler-artifact","fresh":true,"target":{"name":"old","src_path":"/ws/crates/old/src/lib.rs"}}"#,
            r#"{"reason":"compiler-artifact","fresh":false,"target":{"name":"core","src_path":"/ws/crates/core/src/lib.rs"}}"#,
            r#"{"reason":"compiler-artifact","fresh":false,"target":{"name":"serde","src_path":"/registry/serde/src/lib.rs"}}"#,
            r#"{"reason":"compiler-message","message":{"message":"m","level":"error","spans":[{"file_name":"backend/src/api.rs","line_start":1},{"file_name":"/abs/src/x.rs","line_start":1}],"children":[]}}"#,
            "garbage line",
        ];

        let scope = CompiledScope::from_stream(lines, Some(Path::new("/ws")));
        let expected: BTreeSet<String> =
            ["crates/core", "backend"].iter().map(|s| s.to_string()).collect();
        assert_eq!(scope, CompiledScope::Restricted(expected));

        assert!(scope.contains("crates/core/src/lib.rs"));
        assert!(scope.contains("backend/src/api.rs"));
        assert!(!scope.contains("crates/old/src/lib.rs"));
        assert!(!scope.contains("frontend/src/main.rs"));
        assert!(scope.contains("main.rs"));
    }

    #[test]
    fn test_unrestricted_contains_everything() {
        assert!(CompiledScope::Unrestricted.contains("anything/at/all.rs"));
    }
}
