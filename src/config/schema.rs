//! Configuration schema for confsync
//!
//! Configuration is stored at `~/.config/confsync/config.toml`

use crate::error::{ConfsyncError, ConfsyncResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Namespace used when none is given and when discovery degrades
pub const DEFAULT_NAMESPACE: &str = "application";

/// Port assumed when the server URL does not carry one
pub const DEFAULT_SERVER_PORT: u16 = 8090;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote client settings
    pub client: ClientConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Construction parameters for a [`crate::ConfigClient`]
///
/// Two clients built from equal (canonicalized) settings share one
/// instance through [`crate::ClientRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Application id (required)
    pub app_id: String,

    /// Cluster name
    pub cluster: String,

    /// Base URL of the config service, e.g. `http://localhost:8090`
    pub server_url: String,

    /// Environment tag, informational only
    pub env: String,

    /// Client timeout in seconds; each HTTP call gets half of it
    pub timeout_secs: u64,

    /// Seconds between background refresh passes
    pub sync_interval_secs: u64,

    /// Directory holding one snapshot file per namespace
    pub cache_dir: PathBuf,

    /// Value of the `Authorization` header sent on every remote call
    pub authorization: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            cluster: "default".to_string(),
            server_url: "http://localhost:8090".to_string(),
            env: "DEV".to_string(),
            timeout_secs: 30,
            sync_interval_secs: 60,
            cache_dir: default_cache_dir(),
            authorization: None,
        }
    }
}

/// Default snapshot directory
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("confsync")
        .join("config")
}

impl ClientConfig {
    /// Create settings for an application with every other field defaulted
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    /// Normalize fields that have several spellings for the same client
    pub fn canonical(&self) -> Self {
        let mut config = self.clone();
        config.app_id = config.app_id.trim().to_string();
        config.cluster = config.cluster.trim().to_string();
        config.env = config.env.trim().to_string();
        config.server_url = config.server_url.trim().trim_end_matches('/').to_string();
        config.authorization = config
            .authorization
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        config
    }

    /// Reject settings a client cannot run with
    pub fn validate(&self) -> ConfsyncResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(ConfsyncError::SettingsInvalid("app_id is empty".to_string()));
        }
        if self.cluster.trim().is_empty() {
            return Err(ConfsyncError::SettingsInvalid("cluster is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfsyncError::SettingsInvalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.sync_interval_secs == 0 {
            return Err(ConfsyncError::SettingsInvalid(
                "sync_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Bound applied to a single HTTP call and to the reachability check
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs((self.timeout_secs / 2).max(1))
    }

    /// Delay between two background passes
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[client]"));
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [client]
            app_id = "billing"
            timeout_secs = 10
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.client.app_id, "billing");
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.client.cluster, "default"); // default preserved
        assert_eq!(config.client.sync_interval_secs, 60);
    }

    #[test]
    fn canonical_merges_equivalent_settings() {
        let mut a = ClientConfig::new("test");
        a.server_url = "http://cfg:8080/".to_string();
        a.authorization = Some("  ".to_string());
        let mut b = ClientConfig::new(" test ");
        b.server_url = "http://cfg:8080".to_string();

        assert_ne!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn validate_rejects_empty_app_id() {
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("test").validate().is_ok());
    }

    #[test]
    fn request_timeout_is_half_with_floor() {
        let mut config = ClientConfig::new("test");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        config.timeout_secs = 1;
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
