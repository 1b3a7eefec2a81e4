//! On-disk last-known-good snapshots
//!
//! One file per (app id, namespace), named `{app}_configuration_{ns}.txt`,
//! holding the `configurations` JSON text of the last release fetched. Persistence is best effort:
//! failures are logged and never interrupt a refresh.

use crate::cache::memory::ConfigSnapshot;
use crate::error::{ConfsyncError, ConfsyncResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, warn};

const RECORD_INFIX: &str = "_configuration_";
const RECORD_EXT: &str = ".txt";

/// Snapshot store backed by a cache directory
#[derive(Debug)]
pub struct LocalCacheStore {
    cache_dir: PathBuf,

    /// Last release key persisted per (app id, namespace) by this process
    written: Mutex<HashMap<(String, String), String>>,
}

impl LocalCacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            written: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory if it is missing
    pub async fn ensure_dir(&self) -> ConfsyncResult<()> {
        fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
            ConfsyncError::io(
                format!("creating cache directory {}", self.cache_dir.display()),
                e,
            )
        })
    }

    /// Persist the raw `configurations` text unless `release_key` is the one
    /// last written here
    ///
    /// Returns whether the file was written. Errors are logged and reported
    /// as `false`.
    pub async fn write(&self, app_id: &str, namespace: &str, release_key: &str, raw: &str) -> bool {
        let key = (app_id.to_string(), namespace.to_string());
        if self.last_written(&key).as_deref() == Some(release_key) {
            debug!(
                "Release {} of {} already persisted, skipping write",
                release_key, namespace
            );
            return false;
        }

        match self.persist(app_id, namespace, raw).await {
            Ok(path) => {
                debug!(
                    "Persisted {} release {} to {}",
                    namespace,
                    release_key,
                    path.display()
                );
                self.remember(key, release_key);
                true
            }
            Err(e) => {
                warn!("Failed to persist namespace {}: {}", namespace, e);
                false
            }
        }
    }

    /// Last persisted snapshot for a namespace, `None` if absent or unreadable
    pub async fn read(&self, app_id: &str, namespace: &str) -> Option<ConfigSnapshot> {
        let path = match self.record_path(app_id, namespace) {
            Ok(path) => path,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        match read_record(&path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring local record for {}: {}", namespace, e);
                None
            }
        }
    }

    /// Every readable record of `app_id`, keyed by namespace
    pub async fn read_all(&self, app_id: &str) -> HashMap<String, ConfigSnapshot> {
        let mut snapshots = HashMap::new();

        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cannot scan cache directory {}: {}",
                    self.cache_dir.display(),
                    e
                );
                return snapshots;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped scanning cache directory: {}", e);
                    break;
                }
            };

            let file_name = entry.file_name();
            let Some(namespace) = file_name
                .to_str()
                .and_then(|name| record_namespace(app_id, name))
            else {
                continue;
            };

            match read_record(&entry.path()).await {
                Ok(Some(snapshot)) => {
                    snapshots.insert(namespace.to_string(), snapshot);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping local record: {}", e),
            }
        }

        debug!(
            "Loaded {} local record(s) for {}",
            snapshots.len(),
            app_id
        );
        snapshots
    }

    fn record_path(&self, app_id: &str, namespace: &str) -> ConfsyncResult<PathBuf> {
        if !is_plain_component(app_id) || !is_plain_component(namespace) {
            return Err(ConfsyncError::User(format!(
                "refusing cache record name for {}/{}",
                app_id, namespace
            )));
        }
        Ok(self.cache_dir.join(record_file_name(app_id, namespace)))
    }

    async fn persist(
        &self,
        app_id: &str,
        namespace: &str,
        raw: &str,
    ) -> ConfsyncResult<PathBuf> {
        let path = self.record_path(app_id, namespace)?;
        self.ensure_dir().await?;

        // Write beside the record, then rename over it
        let staging = path.with_extension("tmp");
        fs::write(&staging, raw)
            .await
            .map_err(|e| ConfsyncError::io(format!("writing {}", staging.display()), e))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| ConfsyncError::io(format!("replacing {}", path.display()), e))?;

        Ok(path)
    }

    fn last_written(&self, key: &(String, String)) -> Option<String> {
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn remember(&self, key: (String, String), release_key: &str) {
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, release_key.to_string());
    }
}

/// File name of the record for (app id, namespace)
pub fn record_file_name(app_id: &str, namespace: &str) -> String {
    format!("{}{}{}{}", app_id, RECORD_INFIX, namespace, RECORD_EXT)
}

/// Namespace encoded in a record file name, if it belongs to `app_id`
fn record_namespace<'a>(app_id: &str, file_name: &'a str) -> Option<&'a str> {
    let namespace = file_name
        .strip_prefix(app_id)?
        .strip_prefix(RECORD_INFIX)?
        .strip_suffix(RECORD_EXT)?;
    // `a_configuration_b_configuration_c.txt` may belong to app `a_configuration_b`
    (!namespace.is_empty() && !namespace.contains(RECORD_INFIX)).then_some(namespace)
}

fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
}

async fn read_record(path: &Path) -> ConfsyncResult<Option<ConfigSnapshot>> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfsyncError::io(format!("inspecting {}", path.display()), e)),
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ConfsyncError::io(format!("reading {}", path.display()), e))?;

    ConfigSnapshot::parse(content.trim())
        .map(Some)
        .map_err(|e| ConfsyncError::malformed_record(path, e))
}
