use std::fs;
use std::path::{Path, PathBuf};

use super::{get_global_config_dir, ConfigValidator, DiagConfig};
use crate::error::{DiagError, DiagResult, ErrorCode};

/// Per-project configuration file, looked up in the workspace root
pub const PROJECT_CONFIG_FILE: &str = ".cargo-diag.toml";

/// Load the configuration that applies to `workspace_root`
///
/// The project file wins over the user file; with neither present the
/// defaults are used. Environment overrides are applied last.
pub fn load_config(workspace_root: &Path) -> DiagResult<DiagConfig> {
    let global = get_global_config_dir()
        .ok()
        .map(|dir| dir.join("config.toml"));
    load_from(workspace_root, global.as_deref())
}

fn load_from(workspace_root: &Path, global_file: Option<&Path>) -> DiagResult<DiagConfig> {
    let candidates: Vec<PathBuf> = std::iter::once(workspace_root.join(PROJECT_CONFIG_FILE))
        .chain(global_file.map(Path::to_path_buf))
        .collect();

    let source = candidates.iter().find(|path| path.is_file());
    let mut config = match source {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            read_file(path)?
        }
        None => DiagConfig::default(),
    };

    config.merge_env_vars();
    ConfigValidator::validate(&config, source.map(PathBuf::as_path))?;
    Ok(config)
}

fn read_file(path: &Path) -> DiagResult<DiagConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        DiagError::config(
            ErrorCode::CONFIG_READ_FAILED,
            "Failed to read configuration file",
            Some(path.to_path_buf()),
        )
        .with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        DiagError::config(
            ErrorCode::CONFIG_INVALID_TOML,
            format!("Invalid configuration: {}", e.message()),
            Some(path.to_path_buf()),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_project_file_wins() {
        let temp_dir = TempDir::new().unwrap();
        let ws = temp_dir.path().join("ws");
        fs::create_dir_all(&ws).unwrap();
        fs::write(ws.join(PROJECT_CONFIG_FILE), "log_dir = \"/logs\"\n").unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "log_dir = \"/global-logs\"\ncargo = \"other\"\n").unwrap();

        let config = load_from(&ws, Some(&global)).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/logs"));
        assert_eq!(config.cargo, "cargo");
    }

    #[test]
    fn test_global_file_then_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[watch]\noverall_timeout = \"20m\"\n").unwrap();

        let config = load_from(temp_dir.path(), Some(&global)).unwrap();
        assert_eq!(config.watch.overall_timeout, Duration::from_secs(1200));

        let missing = temp_dir.path().join("missing.toml");
        let config = load_from(temp_dir.path(), Some(&missing)).unwrap();
        assert_eq!(config.cargo, "cargo");
    }

    #[test]
    fn test_zero_heartbeat_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[watch]\nheartbeat_interval = \"0s\"\n",
        )
        .unwrap();

        let err = load_from(temp_dir.path(), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[watch]\nstall_timeout = \"soon\"\n",
        )
        .unwrap();

        let err = load_from(temp_dir.path(), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_TOML);
        assert_eq!(err.exit_code(), 2);
    }
}
