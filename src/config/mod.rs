use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::cleanup::{DEFAULT_MAX_IMAGE_ROUNDS, DEFAULT_STOP_GRACE, EngineSettings};

/// Settings read from `config.toml`; every field is optional in the file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SkiffConfig {
    pub log_file: PathBuf,
    pub log_level: String,
    pub json_logs: bool,
    pub quiet: bool,
    pub docker_socket: Option<String>,
    pub stop_grace_secs: u64,
    pub prefer_prune: bool,
    pub max_image_rounds: usize,
}

impl Default for SkiffConfig {
    fn default() -> Self {
        Self {
            log_file: default_data_dir().join("skiff.log"),
            log_level: "info".to_string(),
            json_logs: false,
            quiet: false,
            docker_socket: None,
            stop_grace_secs: DEFAULT_STOP_GRACE.as_secs(),
            prefer_prune: true,
            max_image_rounds: DEFAULT_MAX_IMAGE_ROUNDS,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skiff")
}

impl SkiffConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skiff")
            .join("config.toml")
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration at {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid configuration in {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SkiffConfig =
            toml::from_str(content).with_context(|| "Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(anyhow!("log_level must not be empty"));
        }
        if self.max_image_rounds == 0 {
            return Err(anyhow!("max_image_rounds must be at least 1"));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(anyhow!("log_file must not be empty"));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            stop_grace: Duration::from_secs(self.stop_grace_secs),
            prefer_prune: self.prefer_prune,
            max_image_rounds: self.max_image_rounds,
        }
    }
}
