//! Test doubles for the remote layer.

use crate::remote::transport::{HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Transport answering from canned results keyed by URL suffix.
///
/// The longest matching suffix wins; unmatched URLs are refused.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
    pub(crate) requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub(crate) fn respond(&self, suffix: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            suffix.to_string(),
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub(crate) fn fail(&self, suffix: &str, error: TransportError) {
        self.routes
            .lock()
            .unwrap()
            .insert(suffix.to_string(), Err(error));
    }

    /// Drop every route, so all further calls are refused
    pub(crate) fn clear(&self) {
        self.routes.lock().unwrap().clear();
    }

    pub(crate) fn request_count(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        _timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));
        self.routes
            .lock()
            .unwrap()
            .iter()
            .filter(|(suffix, _)| url.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Err(TransportError::ConnectionRefused("no route".into())))
    }
}

/// Release endpoint payload with `configurations` JSON-encoded as a string
pub(crate) fn release_body(release_key: &str, configurations: &str) -> String {
    serde_json::json!({ "releaseKey": release_key, "configurations": configurations }).to_string()
}

/// Namespace listing payload
pub(crate) fn namespaces_body(names: &[&str]) -> String {
    let entries: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(id, name)| serde_json::json!({ "namespaceName": name, "id": id }))
        .collect();
    serde_json::Value::Array(entries).to_string()
}
