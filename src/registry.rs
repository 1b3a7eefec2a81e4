//! Process-owned registry of shared clients
//!
//! One client exists per distinct canonical [`ClientConfig`]. Callers ask
//! the registry explicitly instead of relying on a global instance.

use crate::client::ConfigClient;
use crate::config::ClientConfig;
use crate::error::ConfsyncResult;
use crate::remote::{Transport, UreqTransport};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct ClientRegistry {
    transport: Arc<dyn Transport>,
    clients: Mutex<HashMap<ClientConfig, Arc<ConfigClient>>>,
}

impl ClientRegistry {
    /// Registry whose clients speak HTTP through `ureq`
    pub fn new() -> Self {
        Self::with_transport(Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Return the client for `config`, constructing it on first request
    ///
    /// Construction happens under the registry lock, so concurrent callers
    /// with equal settings share a single instance.
    pub async fn get_or_create(
        &self,
        config: ClientConfig,
    ) -> ConfsyncResult<Arc<ConfigClient>> {
        let key = config.canonical();
        let mut clients = self.clients.lock().await;

        if let Some(client) = clients.get(&key) {
            debug!("Reusing client for {}", key.app_id);
            return Ok(Arc::clone(client));
        }

        let transport = Arc::clone(&self.transport);
        let client = Arc::new(ConfigClient::with_transport(key.clone(), transport).await?);
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    /// Client already built for `config`, if any
    pub async fn get(&self, config: &ClientConfig) -> Option<Arc<ConfigClient>> {
        self.clients.lock().await.get(&config.canonical()).cloned()
    }

    /// Forget the client for `config` and stop its polling
    pub async fn remove(&self, config: &ClientConfig) -> Option<Arc<ConfigClient>> {
        let client = self.clients.lock().await.remove(&config.canonical());
        if let Some(client) = &client {
            client.stop();
        }
        client
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::ScriptedTransport;
    use tempfile::TempDir;

    fn registry() -> (ClientRegistry, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        (ClientRegistry::with_transport(transport.clone()), transport)
    }

    fn settings(temp: &TempDir, app_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new(app_id);
        config.server_url = "http://cfg:8080".to_string();
        config.cache_dir = temp.path().to_path_buf();
        config
    }

    #[tokio::test]
    async fn equal_settings_share_one_client() {
        let temp = TempDir::new().unwrap();
        let (registry, transport) = registry();

        let a = registry.get_or_create(settings(&temp, "test")).await.unwrap();
        let mut respelled = settings(&temp, " test ");
        respelled.server_url = "http://cfg:8080/".to_string();
        let b = registry.get_or_create(respelled).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().await, 1);
        // Only the first lookup built a client and ran a pass
        assert_eq!(transport.request_count("/namespaces"), 1);
    }

    #[tokio::test]
    async fn different_settings_get_different_clients() {
        let temp = TempDir::new().unwrap();
        let (registry, _transport) = registry();

        let a = registry.get_or_create(settings(&temp, "test")).await.unwrap();
        let mut other_cluster = settings(&temp, "test");
        other_cluster.cluster = "SHAJQ".to_string();
        let b = registry.get_or_create(other_cluster).await.unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn lookup_and_remove() {
        let temp = TempDir::new().unwrap();
        let (registry, _transport) = registry();
        let config = settings(&temp, "test");

        assert!(registry.get(&config).await.is_none());
        registry.get_or_create(config.clone()).await.unwrap();
        assert!(registry.get(&config).await.is_some());

        assert!(registry.remove(&config).await.is_some());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_settings_are_not_registered() {
        let temp = TempDir::new().unwrap();
        let (registry, _transport) = registry();

        assert!(registry.get_or_create(settings(&temp, "")).await.is_err());
        assert!(registry.is_empty().await);
    }
}
