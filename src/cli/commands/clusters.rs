//! Clusters command - list clusters of the application

use crate::config::Config;
use crate::error::ConfsyncResult;
use crate::remote::{RemoteConfigSource, UreqTransport};
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the clusters command
pub async fn execute(config: &Config) -> ConfsyncResult<()> {
    let settings = config.client.canonical();
    settings.validate()?;

    let remote = RemoteConfigSource::new(&settings, Arc::new(UreqTransport::new()))?;
    let clusters = remote.list_clusters(&settings.app_id).await;

    if clusters.is_empty() {
        let ctx = UiContext::detect();
        ui::step_warn_hint(
            &ctx,
            &format!("No clusters found for {}", settings.app_id),
            &format!("Is {} reachable?", remote.base_url()),
        );
        return Ok(());
    }

    for cluster in clusters {
        println!("{}", cluster);
    }
    Ok(())
}
