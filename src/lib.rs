//! # emoji-export
//!
//! Exports every custom emoji of a Slack workspace into a local directory:
//! one content-addressed image file per emoji plus an append-only
//! `emoji.catalog` of JSON lines pairing each file with its metadata.
//!
//! ## Pipeline
//!
//! - [`lister::SlackLister`] pages through `emoji.adminList`
//! - [`exporter::Exporter`] consumes the listing, downloading one image at a time
//! - [`store::Store`] writes each image and appends its catalog line
//!
//! ## Quick Start
//!
//! ```no_run
//! use emoji_export::{Config, Exporter, Store};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.json".as_ref())?;
//!     let store = Store::new(&config.directory).await?;
//!     let exporter = Exporter::new(&config, store)?;
//!
//!     let cancel = CancellationToken::new();
//!     tokio::spawn(emoji_export::cancel_on_signal(cancel.clone()));
//!
//!     let summary = exporter.run(cancel).await?;
//!     println!("stored {} of {} emoji", summary.stored, summary.expected);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export pipeline orchestration
pub mod exporter;
/// Paginated metadata listing
pub mod lister;
/// Image files and catalog persistence
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, SlackConfig};
pub use error::{Error, Result};
pub use exporter::Exporter;
pub use lister::SlackLister;
pub use store::Store;
pub use types::{CatalogEntry, EmojiRecord, ExportEvent, ExportState, ExportSummary};

/// Cancel `token` when the process receives SIGINT or SIGTERM (Ctrl+C off Unix).
///
/// Returns without cancelling if the token is cancelled by someone else first.
pub async fn cancel_on_signal(token: tokio_util::sync::CancellationToken) {
    tokio::select! {
        signal = wait_for_signal() => {
            tracing::info!(signal, "received signal, cancelling export");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Resolve with the name of the first termination signal received
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "signal registration failed, falling back to ctrl_c");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the run can only end on its own.
        tracing::error!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
