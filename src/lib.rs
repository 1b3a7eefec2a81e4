//! confsync - configuration cache synchronizer
//!
//! Keeps a namespace-partitioned snapshot of an application's configuration
//! in memory and on disk, refreshed from a remote config service in the
//! background. Reads are served locally and never block on the network.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod remote;
pub mod sync;
pub mod ui;

pub use cache::{ConfigCache, ConfigSnapshot, LocalCacheStore};
pub use client::ConfigClient;
pub use config::{ClientConfig, DEFAULT_NAMESPACE};
pub use error::{ConfsyncError, ConfsyncResult};
pub use registry::ClientRegistry;
pub use sync::{NamespaceOutcome, SyncReport};
