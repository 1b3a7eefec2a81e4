//! CLI argument definitions using clap derive

use crate::config::{ClientConfig, DEFAULT_NAMESPACE};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// confsync - configuration cache synchronizer
///
/// Keeps a local, namespace-partitioned snapshot of an application's
/// configuration in sync with a remote config service.
#[derive(Parser, Debug)]
#[command(name = "confsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CONFSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (overrides general.log_format)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Client settings overriding the config file
    #[command(flatten)]
    pub client: ClientArgs,
}

/// Client settings accepted on the command line
#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    /// Application id
    #[arg(long, global = true, env = "CONFSYNC_APP_ID")]
    pub app_id: Option<String>,

    /// Cluster name
    #[arg(long, global = true, env = "CONFSYNC_CLUSTER")]
    pub cluster: Option<String>,

    /// Config service base URL
    #[arg(long, global = true, env = "CONFSYNC_SERVER_URL")]
    pub server_url: Option<String>,

    /// Directory for local snapshot files
    #[arg(long, global = true, env = "CONFSYNC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Authorization header value sent with every request
    #[arg(long, global = true, env = "CONFSYNC_AUTHORIZATION", hide_env_values = true)]
    pub authorization: Option<String>,

    /// Client timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl ClientArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(app_id) = &self.app_id {
            config.app_id = app_id.clone();
        }
        if let Some(cluster) = &self.cluster {
            config.cluster = cluster.clone();
        }
        if let Some(server_url) = &self.server_url {
            config.server_url = server_url.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(authorization) = &self.authorization {
            config.authorization = Some(authorization.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one configuration value
    Get(GetArgs),

    /// Print cached namespaces as JSON or key=value lines
    Dump(DumpArgs),

    /// Poll the server and print changes until interrupted
    Watch(WatchArgs),

    /// List clusters of the application
    Clusters,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Configuration key
    pub key: String,

    /// Namespace holding the key
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Value printed when the key is unavailable
    #[arg(short, long)]
    pub default: Option<String>,
}

/// Arguments for the dump command
#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// Only this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Seconds between refresh passes (overrides client.sync_interval_secs)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for dump command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON object per namespace
    Json,
    /// namespace.key=value lines
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse the config file spelling, defaulting to text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}
