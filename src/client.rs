//! Public client: construction, reads, and background polling
//!
//! Construction runs one refresh pass before returning, so the first read
//! already sees the best data available. Reads never fail; a value that no
//! source ever provided degrades to the caller's default.

use crate::cache::{ConfigCache, ConfigSnapshot, LocalCacheStore};
use crate::config::{ClientConfig, DEFAULT_NAMESPACE};
use crate::error::ConfsyncResult;
use crate::remote::{RemoteConfigSource, Transport, UreqTransport};
use crate::sync::{Poller, SyncReport, Synchronizer};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Configuration client for one (app id, cluster, server) combination
pub struct ConfigClient {
    config: ClientConfig,
    cache: Arc<ConfigCache>,
    synchronizer: Arc<Synchronizer>,
    poller: Poller,
}

impl ConfigClient {
    /// Build a client speaking HTTP to `config.server_url`
    pub async fn connect(config: ClientConfig) -> ConfsyncResult<Self> {
        Self::with_transport(config, Arc::new(UreqTransport::new())).await
    }

    /// Build a client over a caller-supplied transport
    pub async fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ConfsyncResult<Self> {
        let config = config.canonical();
        config.validate()?;

        let remote = RemoteConfigSource::new(&config, transport)?;
        let local = LocalCacheStore::new(&config.cache_dir);
        if let Err(e) = local.ensure_dir().await {
            warn!("Local cache unavailable: {}", e);
        }

        let cache = Arc::new(ConfigCache::new());
        let synchronizer = Arc::new(Synchronizer::new(
            config.app_id.clone(),
            config.cluster.clone(),
            remote,
            local,
            Arc::clone(&cache),
        ));
        let poller = Poller::new(Arc::clone(&synchronizer), config.sync_interval());

        info!(
            "Config client for {} (cluster {}, env {}) against {}",
            config.app_id, config.cluster, config.env, config.server_url
        );

        let client = Self {
            config,
            cache,
            synchronizer,
            poller,
        };
        client.refresh().await;
        Ok(client)
    }

    /// Value of `key` in the default namespace, or `default`
    pub fn get(&self, key: &str, default: &str) -> String {
        self.cache.get(DEFAULT_NAMESPACE, key, default)
    }

    /// Value of `key` in `namespace`, or `default`
    pub fn get_in(&self, namespace: &str, key: &str, default: &str) -> String {
        self.cache.get(namespace, key, default)
    }

    /// Value of `key` in `namespace`, if any source provided one
    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.cache.value(namespace, key)
    }

    pub fn snapshot(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        self.cache.snapshot(namespace)
    }

    /// Namespaces with data in memory
    pub fn namespaces(&self) -> Vec<String> {
        self.cache.namespaces()
    }

    /// Start background polling
    ///
    /// If nothing has been cached yet, one more pass runs first on the
    /// caller's task.
    pub async fn start(&self) {
        if self.cache.is_empty() {
            self.refresh().await;
        }
        self.poller.spawn();
    }

    /// Stop background polling after the current pass
    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Run one refresh pass now
    pub async fn refresh(&self) -> SyncReport {
        self.poller.run_once().await
    }

    /// Counter bumped after every background pass
    pub fn passes(&self) -> watch::Receiver<u64> {
        self.poller.passes()
    }

    /// Cluster names of this application
    pub async fn clusters(&self) -> Vec<String> {
        self.synchronizer
            .remote()
            .list_clusters(&self.config.app_id)
            .await
    }

    /// Canonical settings this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Drop for ConfigClient {
    fn drop(&mut self) {
        self.poller.stop();
    }
}
