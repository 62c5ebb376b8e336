//! `emoji-export` command line entry point

use clap::Parser;
use emoji_export::config::DEFAULT_CONFIG_PATH;
use emoji_export::{Config, Exporter, Store};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Export custom emoji images and metadata from a Slack workspace
#[derive(Debug, Parser)]
#[command(name = "emoji-export", version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse config: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Failed to run export: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(config: Config) -> emoji_export::Result<()> {
    let cancel = CancellationToken::new();
    let signals = tokio::spawn(emoji_export::cancel_on_signal(cancel.clone()));

    let store = Store::new(&config.directory)
        .await
        .map_err(|e| e.context("create store"))?;
    let exporter = Exporter::new(&config, store)?;

    let result = exporter
        .run(cancel.clone())
        .await
        .map_err(|e| e.context("exporter run"));

    // Stop listening for signals once the run is over.
    cancel.cancel();
    signals.await.ok();

    let summary = result?;
    tracing::info!(
        stored = summary.stored,
        skipped = summary.skipped,
        expected = summary.expected,
        "export complete"
    );
    Ok(())
}

/// Uses `RUST_LOG` if set, otherwise falls back to `level`.
fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
