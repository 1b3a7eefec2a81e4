//! One refresh pass: discover, fetch, update, fall back
//!
//! Namespaces are fetched concurrently and independently. A namespace
//! whose fetch fails is refilled from its local record if one exists and
//! otherwise left as it was. When discovery itself errors, every local
//! record of the application is loaded in one batch instead.

use crate::cache::{ConfigCache, LocalCacheStore};
use crate::remote::{FetchFailure, RemoteConfigSource};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a pass did to one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceOutcome {
    /// Fetched from the server; `persisted` is false when the release was
    /// already on disk or the write failed
    Refreshed { release_key: String, persisted: bool },

    /// Fetch failed, snapshot reloaded from the local record
    FromLocal(FetchFailure),

    /// Fetch failed and no local record exists; cache left untouched
    Unchanged(FetchFailure),
}

/// Summary of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Per-namespace results, in discovery order
    pub namespaces: Vec<(String, NamespaceOutcome)>,

    /// Discovery failed and the cache was populated from every local record
    pub cold_start: Option<Vec<String>>,
}

impl SyncReport {
    /// Namespaces refreshed from the server
    pub fn refreshed(&self) -> impl Iterator<Item = &str> {
        self.namespaces
            .iter()
            .filter(|(_, o)| matches!(o, NamespaceOutcome::Refreshed { .. }))
            .map(|(ns, _)| ns.as_str())
    }

    /// True when every namespace came from the server
    pub fn is_clean(&self) -> bool {
        self.cold_start.is_none()
            && self
                .namespaces
                .iter()
                .all(|(_, o)| matches!(o, NamespaceOutcome::Refreshed { .. }))
    }

    pub fn outcome(&self, namespace: &str) -> Option<&NamespaceOutcome> {
        self.namespaces
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, o)| o)
    }
}

/// Drives the remote source, the local store and the in-memory cache
pub struct Synchronizer {
    app_id: String,
    cluster: String,
    remote: RemoteConfigSource,
    local: LocalCacheStore,
    cache: Arc<ConfigCache>,
}

impl Synchronizer {
    pub fn new(
        app_id: impl Into<String>,
        cluster: impl Into<String>,
        remote: RemoteConfigSource,
        local: LocalCacheStore,
        cache: Arc<ConfigCache>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            cluster: cluster.into(),
            remote,
            local,
            cache,
        }
    }

    pub fn remote(&self) -> &RemoteConfigSource {
        &self.remote
    }

    pub fn local(&self) -> &LocalCacheStore {
        &self.local
    }

    /// Run one complete refresh pass
    pub async fn run_pass(&self) -> SyncReport {
        let namespaces = match self
            .remote
            .list_namespaces(&self.app_id, &self.cluster)
            .await
        {
            Ok(namespaces) => namespaces,
            Err(e) => {
                warn!("{}; loading all local records of {}", e, self.app_id);
                return self.recover_from_local().await;
            }
        };

        let outcomes = join_all(namespaces.iter().map(|ns| self.sync_namespace(ns))).await;

        let report = SyncReport {
            namespaces: namespaces.into_iter().zip(outcomes).collect(),
            cold_start: None,
        };
        debug!(
            "Pass for {} done: {} of {} namespace(s) refreshed",
            self.app_id,
            report.refreshed().count(),
            report.namespaces.len()
        );
        report
    }

    async fn sync_namespace(&self, namespace: &str) -> NamespaceOutcome {
        let failure = match self
            .remote
            .fetch_latest_release(&self.app_id, &self.cluster, namespace)
            .await
        {
            Ok(release) => {
                self.cache.set(namespace, release.snapshot.clone());
                let persisted = self
                    .local
                    .write(&self.app_id, namespace, &release.release_key, &release.raw)
                    .await;
                return NamespaceOutcome::Refreshed {
                    release_key: release.release_key,
                    persisted,
                };
            }
            Err(failure) => failure,
        };

        match &failure {
            FetchFailure::ServerUnreachable(server) => {
                warn!("Server {} unreachable while fetching {}", server, namespace)
            }
            FetchFailure::NamespaceUnavailable => {
                warn!("Namespace {} unavailable on a reachable server", namespace)
            }
            FetchFailure::Status(status) => {
                info!("Namespace {} answered HTTP {}", namespace, status)
            }
            FetchFailure::Transport(_) | FetchFailure::Malformed(_) => {
                warn!("Fetching namespace {} failed: {}", namespace, failure)
            }
        }

        match self.local.read(&self.app_id, namespace).await {
            Some(snapshot) => {
                info!("Serving namespace {} from local cache file", namespace);
                self.cache.set(namespace, snapshot);
                NamespaceOutcome::FromLocal(failure)
            }
            None => {
                debug!("No local record for {}, keeping cached copy", namespace);
                NamespaceOutcome::Unchanged(failure)
            }
        }
    }

    async fn recover_from_local(&self) -> SyncReport {
        let records = self.local.read_all(&self.app_id).await;
        let mut restored: Vec<String> = records.keys().cloned().collect();
        restored.sort();
        info!(
            "Restored {} namespace(s) of {} from local cache files",
            restored.len(),
            self.app_id
        );
        self.cache.set_all(records);

        SyncReport {
            namespaces: Vec::new(),
            cold_start: Some(restored),
        }
    }
}
