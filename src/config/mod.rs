//! Configuration file handling
//!
//! The file supplies defaults for every [`ClientConfig`] the CLI builds;
//! command-line flags are applied on top by the caller.

pub mod schema;

pub use schema::{ClientConfig, Config, DEFAULT_NAMESPACE};

use crate::error::{ConfsyncError, ConfsyncResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, reads and writes the confsync TOML file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `~/.config/confsync/config.toml` (platform equivalent)
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit `--config` / `CONFSYNC_CONFIG` path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confsync")
            .join("config.toml")
    }

    /// Read the file, or built-in defaults when it does not exist yet
    ///
    /// The returned client settings are not validated; an empty `app_id`
    /// is only rejected once a client is built from them. Syntax and type
    /// errors are reported as `ConfigInvalid`.
    pub async fn load(&self) -> ConfsyncResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(ConfsyncError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| ConfsyncError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config` as pretty TOML, creating parent directories
    pub async fn save(&self, config: &Config) -> ConfsyncResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ConfsyncError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> ConfsyncResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfsyncError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
