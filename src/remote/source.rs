//! Namespace discovery and release retrieval against the config service

use crate::cache::ConfigSnapshot;
use crate::config::schema::DEFAULT_SERVER_PORT;
use crate::config::{ClientConfig, DEFAULT_NAMESPACE};
use crate::error::{ConfsyncError, ConfsyncResult};
use crate::remote::transport::{HttpResponse, Transport, TransportError};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use url::{Host, Url};

/// Latest release of one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub release_key: String,
    pub snapshot: ConfigSnapshot,

    /// `configurations` exactly as served, persisted as the local record
    pub raw: String,
}

/// Why a remote call yielded no usable data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server answered HTTP {0}")]
    Status(u16),

    /// Request timed out and the server refuses plain connections
    #[error("server {0} is not responding")]
    ServerUnreachable(String),

    /// Request timed out although the server accepts connections
    #[error("request timed out on a reachable server")]
    NamespaceUnavailable,

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Entry of the namespace listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceInfo {
    pub namespace_name: String,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseBody {
    #[serde(default)]
    release_key: Option<String>,
    #[serde(default)]
    configurations: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    name: String,
}

/// Host and port of the config service, used for the reachability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Extract host and port from a base URL; the port defaults to 8090
    pub fn parse(url: &str) -> ConfsyncResult<Self> {
        let parsed = Url::parse(url).map_err(|e| {
            ConfsyncError::SettingsInvalid(format!("invalid server URL {}: {}", url, e))
        })?;

        let host = match parsed.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(host) => host.to_string(),
            None => {
                return Err(ConfsyncError::SettingsInvalid(format!(
                    "no host in server URL {}",
                    url
                )))
            }
        };

        Ok(Self {
            host,
            port: parsed.port().unwrap_or(DEFAULT_SERVER_PORT),
        })
    }
}

/// Read-only client of the config service HTTP API
pub struct RemoteConfigSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    address: ServerAddress,
    headers: Vec<(String, String)>,
    timeout: Duration,
}

impl RemoteConfigSource {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> ConfsyncResult<Self> {
        let base_url = config.server_url.trim_end_matches('/').to_string();
        let address = ServerAddress::parse(&base_url)?;
        let headers = config
            .authorization
            .iter()
            .map(|token| ("Authorization".to_string(), token.clone()))
            .collect();

        Ok(Self {
            transport,
            base_url,
            address,
            headers,
            timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Namespaces of `app_id` in `cluster`
    ///
    /// A non-success answer degrades to the default namespace alone. A
    /// request that got no answer, or an unparseable body, is reported as an
    /// error so the caller can fall back to every local record.
    pub async fn list_namespaces(
        &self,
        app_id: &str,
        cluster: &str,
    ) -> ConfsyncResult<Vec<String>> {
        let url = format!(
            "{}/apps/{}/clusters/{}/namespaces",
            self.base_url, app_id, cluster
        );

        let response = match self.get(&url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(
                    "Namespace listing answered HTTP {}, assuming only {}",
                    response.status, DEFAULT_NAMESPACE
                );
                return Ok(default_namespaces());
            }
            Err(failure) => return Err(ConfsyncError::Discovery(failure)),
        };

        let listing: Vec<NamespaceInfo> = serde_json::from_str(&response.body).map_err(|e| {
            ConfsyncError::Discovery(FetchFailure::Malformed(format!("namespace listing: {}", e)))
        })?;

        let mut namespaces: Vec<String> =
            listing.into_iter().map(|ns| ns.namespace_name).collect();
        namespaces.sort();
        namespaces.dedup();
        debug!(
            "Discovered namespaces for {}/{}: {:?}",
            app_id, cluster, namespaces
        );
        Ok(namespaces)
    }

    /// Latest release of one namespace
    pub async fn fetch_latest_release(
        &self,
        app_id: &str,
        cluster: &str,
        namespace: &str,
    ) -> Result<Release, FetchFailure> {
        let url = format!(
            "{}/apps/{}/clusters/{}/namespaces/{}/releases/latest",
            self.base_url, app_id, cluster, namespace
        );

        let response = self.get(&url).await?;
        if !response.is_success() {
            return Err(FetchFailure::Status(response.status));
        }

        let release = parse_release(&response.body)?;
        info!(
            "Fetched namespace {} release {} ({} keys)",
            namespace,
            release.release_key,
            release.snapshot.len()
        );
        Ok(release)
    }

    /// Cluster names of `app_id`; empty when the listing cannot be read
    pub async fn list_clusters(&self, app_id: &str) -> Vec<String> {
        let url = format!("{}/apps/{}/clusters", self.base_url, app_id);

        let body = match self.get(&url).await {
            Ok(response) if response.is_success() => response.body,
            Ok(response) => {
                warn!("Cluster listing answered HTTP {}", response.status);
                return Vec::new();
            }
            Err(failure) => {
                warn!("Cluster listing failed: {}", failure);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<ClusterInfo>>(&body) {
            Ok(clusters) => clusters.into_iter().map(|c| c.name).collect(),
            Err(e) => {
                warn!("Malformed cluster listing: {}", e);
                Vec::new()
            }
        }
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, FetchFailure> {
        match self.transport.get(url, &self.headers, self.timeout).await {
            Ok(response) => Ok(response),
            Err(TransportError::Timeout) => Err(self.check_reachability().await),
            Err(e) => Err(FetchFailure::Transport(e.to_string())),
        }
    }

    /// Classify a timed-out request by opening a bare connection to the server
    async fn check_reachability(&self) -> FetchFailure {
        let host = self.address.host.as_str();
        let connect = TcpStream::connect((host, self.address.port));

        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => {
                debug!("{}:{} accepts connections", host, self.address.port);
                FetchFailure::NamespaceUnavailable
            }
            Ok(Err(e)) => {
                debug!("Reachability check of {}:{} failed: {}", host, self.address.port, e);
                FetchFailure::ServerUnreachable(self.base_url.clone())
            }
            Err(_) => FetchFailure::ServerUnreachable(self.base_url.clone()),
        }
    }
}

fn default_namespaces() -> Vec<String> {
    vec![DEFAULT_NAMESPACE.to_string()]
}

fn parse_release(body: &str) -> Result<Release, FetchFailure> {
    let body: ReleaseBody =
        serde_json::from_str(body).map_err(|e| FetchFailure::Malformed(e.to_string()))?;

    let raw = match body.configurations {
        None | Some(serde_json::Value::Null) => "{}".to_string(),
        Some(serde_json::Value::String(raw)) => raw,
        Some(object @ serde_json::Value::Object(_)) => object.to_string(),
        Some(other) => {
            return Err(FetchFailure::Malformed(format!(
                "unexpected configurations payload: {}",
                other
            )))
        }
    };
    let snapshot = ConfigSnapshot::parse(&raw)
        .map_err(|e| FetchFailure::Malformed(format!("configurations: {}", e)))?;

    let release_key = body
        .release_key
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| format!("unkeyed-{}", Utc::now().timestamp_millis()));

    Ok(Release {
        release_key,
        snapshot,
        raw,
    })
}
