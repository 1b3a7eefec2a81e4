//! Get command - print a single value

use crate::cli::args::GetArgs;
use crate::client::ConfigClient;
use crate::config::Config;
use crate::error::{ConfsyncError, ConfsyncResult};

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> ConfsyncResult<()> {
    let client = ConfigClient::connect(config.client.clone()).await?;

    let value = match (client.value(&args.namespace, &args.key), args.default) {
        (Some(value), _) => value,
        (None, Some(default)) => default,
        (None, None) => {
            return Err(ConfsyncError::User(format!(
                "Key '{}' not found in namespace '{}'",
                args.key, args.namespace
            )))
        }
    };

    println!("{}", value);
    Ok(())
}
