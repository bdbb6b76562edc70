//! Configuration
//!
//! Loaded from a JSON file; every field has a default so partial files work.

use anyhow::{Context, Result as AnyhowResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::session::InstanceId;

/// Directory name used under the platform data directory
const APP_DIR_NAME: &str = "jsonl-record-editor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parent of every instance scratch directory
    pub scratch_root: PathBuf,
    /// Scratch directory name prefix; the instance id is appended
    pub scratch_dir_prefix: String,
    /// Key of the session map in the durable store
    pub store_key: String,
    /// Delay before deleting a closed surface's backing file
    pub close_delay_ms: u64,
    /// Content offered when the selected line is blank
    pub empty_line_placeholder: String,
    /// Location of the durable store file
    pub state_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            scratch_dir_prefix: "jsonl-viewer-window".to_string(),
            store_key: "jsonlViewerTempFileMap".to_string(),
            close_delay_ms: 100,
            empty_line_placeholder: "{}".to_string(),
            state_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> AnyhowResult<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Scratch directory owned by one instance
    pub fn scratch_dir(&self, instance: &InstanceId) -> PathBuf {
        self.scratch_root
            .join(format!("{}-{}", self.scratch_dir_prefix, instance))
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    /// Durable store location, falling back to the platform data directory
    pub fn state_file_path(&self) -> AnyhowResult<PathBuf> {
        if let Some(path) = &self.state_file {
            return Ok(path.clone());
        }
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .context("No data directory available for the session store")?;
        Ok(base.join(APP_DIR_NAME).join("workspace-state.json"))
    }
}
