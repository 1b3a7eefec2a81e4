//! confsync - configuration cache synchronizer
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use confsync::cli::{Cli, Commands, LogFormat};
use confsync::config::ConfigManager;
use confsync::error::ConfsyncResult;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ConfsyncResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = manager.load().await?;
    cli.client.apply(&mut config.client);

    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));
    init_logging(cli.verbose, format);
    debug!("Loaded configuration from {}", manager.path().display());

    match cli.command {
        Commands::Get(args) => confsync::cli::commands::get(args, &config).await,
        Commands::Dump(args) => confsync::cli::commands::dump(args, &config).await,
        Commands::Watch(args) => confsync::cli::commands::watch(args, &config).await,
        Commands::Clusters => confsync::cli::commands::clusters(&config).await,
        Commands::Config(args) => confsync::cli::commands::config(args, &config, &manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; RUST_LOG wins when set
fn init_logging(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "confsync=warn",
        1 => "confsync=info",
        _ => "confsync=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.without_time().init(),
    }
}
