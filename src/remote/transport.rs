//! HTTP transport used to reach the config service
//!
//! The sync engine only needs `GET url -> (status, body)`, so the transport
//! is a trait and the `ureq` agent is one implementation of it.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a request produced no response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("{0}")]
    Other(String),
}

/// Abstract HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET bounded by `timeout`
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let headers = headers.to_vec();

        tokio::task::spawn_blocking(move || {
            debug!("GET {}", url);
            let mut request = agent.get(&url);
            for (name, value) in &headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let mut response = request
                .config()
                .timeout_global(Some(timeout))
                .build()
                .call()
                .map_err(classify_ureq_error)?;

            let status = response.status().as_u16();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(classify_ureq_error)?;

            Ok(HttpResponse { status, body })
        })
        .await
        .map_err(|e| TransportError::Other(format!("request task failed: {}", e)))?
    }
}

fn classify_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => TransportError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            TransportError::ConnectionRefused(e.to_string())
        }
        ureq::Error::ConnectionFailed => {
            TransportError::ConnectionRefused("connection failed".to_string())
        }
        other => TransportError::Other(other.to_string()),
    }
}
