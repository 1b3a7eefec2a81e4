//! Watch command - poll in the foreground and print changes

use crate::cache::ConfigSnapshot;
use crate::cli::args::WatchArgs;
use crate::client::ConfigClient;
use crate::config::Config;
use crate::error::{ConfsyncError, ConfsyncResult};
use crate::ui::{self, ChangeKind, TaskSpinner, UiContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type View = BTreeMap<String, Arc<ConfigSnapshot>>;

/// Execute the watch command
pub async fn execute(args: WatchArgs, config: &Config) -> ConfsyncResult<()> {
    let ctx = UiContext::detect();
    let mut settings = config.client.clone();
    if let Some(interval) = args.interval {
        settings.sync_interval_secs = interval;
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Fetching configuration of {}", settings.app_id));
    let client = ConfigClient::connect(settings).await?;

    let mut view = capture(&client);
    if view.is_empty() {
        spinner.stop_warn("No configuration available yet");
    } else {
        spinner.stop(&format!("Loaded {} namespace(s)", view.len()));
    }
    for (ns, snapshot) in &view {
        for (key, value) in snapshot.iter() {
            ui::change(ChangeKind::Added, ns, key, value);
        }
    }

    let mut passes = client.passes();
    client.start().await;
    ui::step_info(
        &ctx,
        &format!(
            "Polling {} every {}s, Ctrl-C to stop",
            client.config().server_url,
            client.config().sync_interval_secs
        ),
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| ConfsyncError::io("waiting for Ctrl-C", e))?;
                break;
            }
            changed = passes.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = capture(&client);
                let changes = diff(&view, &next);
                debug!("Pass finished with {} change(s)", changes.len());
                for (kind, ns, key, value) in changes {
                    ui::change(kind, &ns, &key, &value);
                }
                view = next;
            }
        }
    }

    client.stop();
    ui::step_ok(&ctx, "Stopped polling");
    Ok(())
}

fn capture(client: &ConfigClient) -> View {
    client
        .namespaces()
        .into_iter()
        .filter_map(|ns| client.snapshot(&ns).map(|s| (ns, s)))
        .collect()
}

/// Key-level differences between two views, ordered by namespace then key
fn diff(before: &View, after: &View) -> Vec<(ChangeKind, String, String, String)> {
    let empty = ConfigSnapshot::default();
    let mut changes = Vec::new();

    let mut namespaces: Vec<&String> = before.keys().chain(after.keys()).collect();
    namespaces.sort();
    namespaces.dedup();

    for ns in namespaces {
        let old = before.get(ns).map(Arc::as_ref).unwrap_or(&empty);
        let new = after.get(ns).map(Arc::as_ref).unwrap_or(&empty);
        if old == new {
            continue;
        }

        for (key, value) in new.iter() {
            match old.get(key) {
                None => changes.push((ChangeKind::Added, ns.clone(), key.into(), value.into())),
                Some(prev) if prev != value => {
                    changes.push((ChangeKind::Modified, ns.clone(), key.into(), value.into()))
                }
                Some(_) => {}
            }
        }
        for (key, _) in old.iter() {
            if new.get(key).is_none() {
                changes.push((ChangeKind::Removed, ns.clone(), key.into(), String::new()));
            }
        }
    }

    changes.sort_by(|a, b| (&a.1, &a.2).cmp(&(&b.1, &b.2)));
    changes
}
