//! Error types for confsync
//!
//! All modules use `ConfsyncResult<T>` as their return type. The sync
//! engine never surfaces these to readers; they end up in the log.

use crate::remote::FetchFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for confsync operations
pub type ConfsyncResult<T> = Result<T, ConfsyncError>;

/// All errors that can occur in confsync
#[derive(Error, Debug)]
pub enum ConfsyncError {
    // Remote errors
    #[error("Namespace discovery failed: {0}")]
    Discovery(#[source] FetchFailure),

    // Local cache errors
    #[error("Malformed local cache record {path}: {reason}")]
    MalformedLocalRecord { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid client settings: {0}")]
    SettingsInvalid(String),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl ConfsyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a malformed local record error
    pub fn malformed_record(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedLocalRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Discovery(FetchFailure::ServerUnreachable(_)) => {
                Some("Check --server-url and that the config service is running")
            }
            Self::SettingsInvalid(_) => Some("Pass --app-id or set app_id in the config file"),
            Self::ConfigInvalid { .. } => Some("Run: confsync config init --force"),
            _ => None,
        }
    }
}
