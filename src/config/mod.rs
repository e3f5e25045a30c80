use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;
pub mod validator;

pub use loader::{load_config, PROJECT_CONFIG_FILE};
pub use validator::ConfigValidator;

use crate::subprocess::WatchSettings;

/// Environment variable overriding where tracker files are kept
pub const STATE_DIR_ENV: &str = "CARGO_DIAG_STATE_DIR";

/// Directory holding the user-wide `config.toml`
pub fn get_global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "cargo-diag", "cargo-diag")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    /// Program used in place of `cargo`
    pub cargo: String,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub watch: WatchSettings,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
            state_dir: std::env::temp_dir(),
            log_dir: std::env::temp_dir(),
            watch: WatchSettings::default(),
        }
    }
}

impl DiagConfig {
    pub fn merge_env_vars(&mut self) {
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            if !dir.is_empty() {
                self.state_dir = PathBuf::from(dir);
            }
        }
    }
}
