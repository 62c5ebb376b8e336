//! Export pipeline -- listing, downloading and storing as one cancellable run.
//!
//! A run moves through [`ExportState`]:
//! `Init -> Counting -> Listing -> Draining -> Done`, with `Failed` or
//! `Cancelled` reachable from any non-terminal state.
//!
//! Listing runs as a background task feeding a bounded channel of [`Listed`]
//! items. The exporter is the only consumer: it downloads one image at a time
//! and hands the body straight to the [`Store`], so catalog lines land in
//! listing order. The first error or the cancellation signal ends the run.

use crate::config::{Config, SlackConfig};
use crate::error::{Error, Result};
use crate::lister::{Listed, PAGE_SIZE, SlackLister};
use crate::store::Store;
use crate::types::{EmojiRecord, ExportEvent, ExportState, ExportSummary};
use crate::utils::{cancellable, is_downloadable};
use futures::TryStreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Capacity of the listing -> exporter record channel
pub const LISTING_CHANNEL_BUFFER: usize = PAGE_SIZE;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Build the default HTTP client, applying the optional per-request timeout
pub fn build_client(slack: &SlackConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = slack.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| Error::Transport {
        context: "create HTTP client".to_string(),
        source: e,
    })
}

/// Exports every custom emoji of a workspace into a [`Store`]
pub struct Exporter {
    lister: SlackLister,
    client: reqwest::Client,
    store: Store,
    event_tx: broadcast::Sender<ExportEvent>,
    span: tracing::Span,
    state: ExportState,
}

impl Exporter {
    /// Create an exporter with a client built from `config`
    pub fn new(config: &Config, store: Store) -> Result<Self> {
        let client = build_client(&config.slack)?;
        Self::with_client(config, store, client)
    }

    /// Create an exporter that issues all requests through `client`
    pub fn with_client(config: &Config, store: Store, client: reqwest::Client) -> Result<Self> {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let lister = SlackLister::new(client.clone(), &config.slack)?.with_events(event_tx.clone());
        let span = tracing::info_span!(
            "emoji_export",
            directory = %store.directory().display()
        );

        Ok(Self {
            lister,
            client,
            store,
            event_tx,
            span,
            state: ExportState::Init,
        })
    }

    /// Log everything this exporter does under `span` instead of the default one
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Subscribe to run events
    ///
    /// [`Exporter::run`] consumes the exporter, so state changes are observed
    /// through [`ExportEvent::StateChanged`] on this receiver. Receivers only
    /// see events sent after they subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<ExportEvent> {
        self.event_tx.subscribe()
    }

    /// Run the export to completion, failure or cancellation
    ///
    /// The store is closed on every exit path. A close failure is reported
    /// only when the run itself succeeded; otherwise the run's error wins.
    pub async fn run(self, cancel: CancellationToken) -> Result<ExportSummary> {
        let span = self.span.clone();
        self.run_to_end(cancel).instrument(span).await
    }

    async fn run_to_end(mut self, cancel: CancellationToken) -> Result<ExportSummary> {
        let result = self.export(&cancel).await;

        match &result {
            Ok(summary) => {
                self.transition(ExportState::Done);
                tracing::info!(
                    expected = summary.expected,
                    stored = summary.stored,
                    skipped = summary.skipped,
                    "export finished"
                );
            }
            Err(e) if e.is_cancelled() => {
                self.transition(ExportState::Cancelled);
                tracing::warn!("export cancelled");
            }
            Err(e) => {
                self.transition(ExportState::Failed);
                tracing::error!(error = %e, code = e.error_code(), "export failed");
            }
        }

        let closed = self.store.close().await;
        match (result, closed) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e.context("close store")),
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "failed to close store after error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    async fn export(&mut self, cancel: &CancellationToken) -> Result<ExportSummary> {
        self.transition(ExportState::Counting);
        let total = self
            .lister
            .count(cancel)
            .await
            .map_err(|e| e.context("check emoji count"))?;
        tracing::info!(total, "counted emoji");
        self.event_tx.send(ExportEvent::Counted { total }).ok();

        self.transition(ExportState::Listing);

        // Dropping the guard on any exit path stops the listing task.
        let producer_token = cancel.child_token();
        let producer_guard = producer_token.clone().drop_guard();
        let (tx, mut rx) = mpsc::channel(LISTING_CHANNEL_BUFFER);
        let lister = self.lister.clone();
        let producer = tokio::spawn(
            async move {
                if let Err(e) = lister.list_all(&producer_token, total, &tx).await {
                    tx.send(Listed::Failed(e.context("list emoji"))).await.ok();
                }
            }
            .instrument(tracing::Span::current()),
        );

        let mut summary = ExportSummary {
            expected: total,
            ..Default::default()
        };

        for _ in 0..total {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                item = rx.recv() => item,
            };

            let record = match item {
                Some(Listed::Record(record)) => record,
                Some(Listed::Failed(e)) => return Err(Error::List(Box::new(e))),
                None => {
                    tracing::warn!(
                        received = summary.stored + summary.skipped,
                        expected = total,
                        "listing ended before the reported total was reached"
                    );
                    break;
                }
            };

            self.process(cancel, record, &mut summary).await?;
        }

        self.transition(ExportState::Draining);
        drop(rx);
        drop(producer_guard);
        if let Err(e) = producer.await {
            tracing::warn!(error = %e, "listing task did not shut down cleanly");
        }

        Ok(summary)
    }

    async fn process(
        &mut self,
        cancel: &CancellationToken,
        record: EmojiRecord,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        if !is_downloadable(&record.url) {
            let reason = if record.url.is_empty() {
                "missing URL".to_string()
            } else {
                format!("URL {:?} is not downloadable", record.url)
            };
            tracing::warn!(name = %record.name, alias = record.is_alias(), %reason, "skipping emoji");
            summary.skipped += 1;
            self.event_tx
                .send(ExportEvent::Skipped {
                    name: record.name,
                    reason,
                })
                .ok();
            return Ok(());
        }

        tracing::info!(name = %record.name, "storing emoji");
        match cancellable(cancel, self.download_and_store(&record)).await {
            Ok(file_name) => {
                summary.stored += 1;
                self.event_tx
                    .send(ExportEvent::Stored {
                        name: record.name,
                        file_name,
                    })
                    .ok();
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                if let Err(discard_err) = self.store.discard_partial(&record).await {
                    tracing::warn!(error = %discard_err, "failed to remove partial file");
                }
                Err(e)
            }
            Err(e) => Err(e.context(format!("store emoji {:?}", record.name))),
        }
    }

    async fn download_and_store(&mut self, record: &EmojiRecord) -> Result<String> {
        let response = self
            .client
            .get(record.url.as_str())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Transport {
                context: "download image".to_string(),
                source: e,
            })?;

        let body = response.bytes_stream().map_err(|e| Error::Transport {
            context: "read image body".to_string(),
            source: e,
        });

        self.store.store_item(record, Box::pin(body)).await
    }

    fn transition(&mut self, state: ExportState) {
        tracing::debug!(from = %self.state, to = %state, "export state change");
        self.state = state;
        self.event_tx.send(ExportEvent::StateChanged { state }).ok();
    }
}
