//! In-memory namespace cache
//!
//! The whole namespace map sits behind an [`ArcSwap`]. A write builds a new
//! map and swaps the pointer, so readers always see either the previous or
//! the next snapshot of a namespace, never a mix.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Key/value content of one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    entries: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    /// Parse the JSON object the config service hands out as `configurations`
    ///
    /// Values that are not JSON strings are kept as their JSON text.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

type NamespaceMap = HashMap<String, Arc<ConfigSnapshot>>;

/// Namespace -> snapshot map that serves every read
#[derive(Debug, Default)]
pub struct ConfigCache {
    namespaces: ArcSwap<NamespaceMap>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` in `namespace`, degrading to `default` when either is absent
    pub fn get(&self, namespace: &str, key: &str, default: &str) -> String {
        self.value(namespace, key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Look up `key` in `namespace`
    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.namespaces
            .load()
            .get(namespace)
            .and_then(|snapshot| snapshot.get(key))
            .map(str::to_string)
    }

    /// Replace the snapshot of one namespace
    pub fn set(&self, namespace: &str, snapshot: ConfigSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.namespaces.rcu(|current| {
            let mut next = NamespaceMap::clone(current);
            next.insert(namespace.to_string(), Arc::clone(&snapshot));
            next
        });
    }

    /// Replace several namespaces in one swap
    pub fn set_all(&self, batch: HashMap<String, ConfigSnapshot>) {
        if batch.is_empty() {
            return;
        }
        let batch: NamespaceMap = batch
            .into_iter()
            .map(|(namespace, snapshot)| (namespace, Arc::new(snapshot)))
            .collect();
        self.namespaces.rcu(|current| {
            let mut next = NamespaceMap::clone(current);
            next.extend(batch.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
            next
        });
    }

    /// Current snapshot of a namespace
    pub fn snapshot(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        self.namespaces.load().get(namespace).cloned()
    }

    /// Namespaces currently cached, sorted
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.load().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.load().is_empty()
    }
}
