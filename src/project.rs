//! Locating the workspace and naming the project

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DiagError, DiagResult, ErrorCode};

const MANIFEST: &str = "Cargo.toml";

/// The workspace a run operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub name: String,
    /// Explicit manifest given on the command line
    pub manifest_path: Option<PathBuf>,
}

impl Project {
    /// Resolve from an explicit manifest, or by searching upwards from `cwd`
    pub fn discover(manifest_path: Option<&Path>, cwd: &Path) -> DiagResult<Self> {
        let (root, manifest_path) = match manifest_path {
            Some(manifest) => {
                let manifest = fs::canonicalize(manifest).map_err(|e| {
                    DiagError::environment(
                        ErrorCode::ENV_MANIFEST_UNREADABLE,
                        format!("Manifest not found: {}", manifest.display()),
                        Some(manifest.to_path_buf()),
                    )
                    .with_source(e)
                })?;
                let root = manifest
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| DiagError::no_manifest(&manifest))?;
                (root, Some(manifest))
            }
            None => (find_workspace_root(cwd)?, None),
        };

        let name = project_name(&root);
        tracing::debug!("Project {} at {}", name, root.display());
        Ok(Self {
            root,
            name,
            manifest_path,
        })
    }
}

/// Nearest ancestor declaring `[workspace]`, else the nearest with any manifest
pub fn find_workspace_root(start: &Path) -> DiagResult<PathBuf> {
    let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

    let workspace = start.ancestors().find(|dir| {
        fs::read_to_string(dir.join(MANIFEST))
            .map(|content| content.contains("[workspace]"))
            .unwrap_or(false)
    });
    if let Some(dir) = workspace {
        return Ok(dir.to_path_buf());
    }

    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| DiagError::no_manifest(&start))
}

/// `package.name` from the root manifest, falling back to the directory name
pub fn project_name(root: &Path) -> String {
    let from_manifest = fs::read_to_string(root.join(MANIFEST))
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("package")?
                .get("name")?
                .as_str()
                .map(str::to_string)
        });

    from_manifest.unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    })
}
