//! Background refresh loop
//!
//! The loop runs a pass, sleeps for the configured interval, and repeats
//! until stopped or until its owner is dropped. Pass failures never end it.

use crate::sync::synchronizer::{SyncReport, Synchronizer};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

pub struct Poller {
    synchronizer: Arc<Synchronizer>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    passes_tx: Arc<watch::Sender<u64>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(synchronizer: Arc<Synchronizer>, interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (passes_tx, _) = watch::channel(0);
        Self {
            synchronizer,
            interval,
            shutdown_tx,
            passes_tx: Arc::new(passes_tx),
            handle: Mutex::new(None),
        }
    }

    /// Run one pass on the caller's task
    pub async fn run_once(&self) -> SyncReport {
        self.synchronizer.run_pass().await
    }

    /// Launch the background loop; returns false if it is already running
    pub fn spawn(&self) -> bool {
        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("Poller already running");
            return false;
        }

        self.shutdown_tx.send_replace(false);
        let synchronizer = Arc::clone(&self.synchronizer);
        let passes_tx = Arc::clone(&self.passes_tx);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.interval;

        *handle = Some(tokio::spawn(run_loop(
            synchronizer,
            interval,
            passes_tx,
            shutdown_rx,
        )));
        info!("Started background refresh every {:?}", interval);
        true
    }

    /// Ask the background loop to exit after its current pass
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Counter bumped after every background pass
    pub fn passes(&self) -> watch::Receiver<u64> {
        self.passes_tx.subscribe()
    }
}

async fn run_loop(
    synchronizer: Arc<Synchronizer>,
    interval: Duration,
    passes_tx: Arc<watch::Sender<u64>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        info!("Entering refresh cycle");
        let report = synchronizer.run_pass().await;
        if !report.is_clean() {
            debug!("Refresh cycle degraded: {:?}", report);
        }
        passes_tx.send_modify(|n| *n += 1);

        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            biased;
            // Stop requested, or the owning poller is gone
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = sleep(interval) => {}
        }
    }
    debug!("Refresh loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ConfigCache, LocalCacheStore};
    use crate::config::ClientConfig;
    use crate::remote::test_support::{namespaces_body, release_body, ScriptedTransport};
    use crate::remote::RemoteConfigSource;
    use tempfile::TempDir;

    type Fixture = (Poller, Arc<ScriptedTransport>, Arc<ConfigCache>, TempDir);

    fn poller(interval: Duration) -> Fixture {
        let temp = TempDir::new().unwrap();
        let mut config = ClientConfig::new("test");
        config.server_url = "http://cfg:8080".to_string();

        let transport = Arc::new(ScriptedTransport::default());
        let cache = Arc::new(ConfigCache::new());
        let sync = Synchronizer::new(
            "test",
            "default",
            RemoteConfigSource::new(&config, transport.clone()).unwrap(),
            LocalCacheStore::new(temp.path()),
            cache.clone(),
        );
        (
            Poller::new(Arc::new(sync), interval),
            transport,
            cache,
            temp,
        )
    }

    #[tokio::test]
    async fn loop_keeps_running_through_failures() {
        let (poller, transport, cache, _temp) = poller(Duration::from_millis(10));
        let mut passes = poller.passes();

        assert!(poller.spawn());
        assert!(!poller.spawn());

        // Nothing answers yet: passes fail but the loop continues
        while *passes.borrow_and_update() < 2 {
            passes.changed().await.unwrap();
        }
        assert!(poller.is_running());
        assert!(cache.is_empty());

        transport.respond("/namespaces", 200, &namespaces_body(&["application"]));
        transport.respond(
            "/releases/latest",
            200,
            &release_body("r1", r#"{"timeout":"60"}"#),
        );
        let seen = *passes.borrow_and_update();
        while *passes.borrow_and_update() < seen + 2 {
            passes.changed().await.unwrap();
        }
        assert_eq!(cache.get("application", "timeout", "30"), "60");

        poller.stop();
    }

    #[tokio::test]
    async fn stop_ends_the_loop() {
        let (poller, _transport, _cache, _temp) = poller(Duration::from_secs(3600));
        let mut passes = poller.passes();
        poller.spawn();
        passes.changed().await.unwrap();

        poller.stop();
        for _ in 0..100 {
            if !poller.is_running() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(!poller.is_running());

        // Can be started again after a stop
        assert!(poller.spawn());
        poller.stop();
    }

    #[tokio::test]
    async fn run_once_does_not_start_loop() {
        let (poller, transport, _cache, _temp) = poller(Duration::from_secs(3600));
        poller.run_once().await;
        assert!(!poller.is_running());
        assert_eq!(transport.request_count("/namespaces"), 1);
    }
}
