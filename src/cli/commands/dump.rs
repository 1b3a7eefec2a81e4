//! Dump command - print cached namespaces

use crate::cache::ConfigSnapshot;
use crate::cli::args::{DumpArgs, OutputFormat};
use crate::client::ConfigClient;
use crate::config::Config;
use crate::error::{ConfsyncError, ConfsyncResult};
use std::collections::BTreeMap;

/// Execute the dump command
pub async fn execute(args: DumpArgs, config: &Config) -> ConfsyncResult<()> {
    let client = ConfigClient::connect(config.client.clone()).await?;

    let namespaces = match args.namespace {
        Some(ns) => vec![ns],
        None => client.namespaces(),
    };

    let mut dump: BTreeMap<String, ConfigSnapshot> = BTreeMap::new();
    for ns in namespaces {
        match client.snapshot(&ns) {
            Some(snapshot) => {
                dump.insert(ns, (*snapshot).clone());
            }
            None => {
                return Err(ConfsyncError::User(format!(
                    "Namespace '{}' has no cached data",
                    ns
                )))
            }
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dump)?),
        OutputFormat::Plain => {
            for line in plain_lines(&dump) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn plain_lines(dump: &BTreeMap<String, ConfigSnapshot>) -> Vec<String> {
    dump.iter()
        .flat_map(|(ns, snapshot)| {
            snapshot
                .iter()
                .map(move |(key, value)| format!("{}.{}={}", ns, key, value))
        })
        .collect()
}
