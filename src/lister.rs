//! Paginated emoji listing against `emoji.adminList`

use crate::config::SlackConfig;
use crate::error::{Error, Result};
use crate::types::{EmojiRecord, ExportEvent, ListResponse};
use crate::utils::cancellable;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Records requested per listing page
pub const PAGE_SIZE: usize = 100;

/// Admin listing path, relative to the workspace base URL
const LIST_PATH: &str = "/api/emoji.adminList";

/// Item flowing from the listing task to the exporter
#[derive(Debug)]
pub enum Listed {
    /// Next record in listing order
    Record(EmojiRecord),
    /// The listing task stopped with this error
    Failed(Error),
}

/// Number of full pages fetched for `total` records
///
/// This is a floor division: a trailing partial page is never requested, so
/// `total = 250` lists 2 pages (200 records).
#[must_use]
pub fn page_count(total: usize) -> usize {
    total / PAGE_SIZE
}

/// Client for the paginated admin listing endpoint
#[derive(Clone, Debug)]
pub struct SlackLister {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
    cookie: String,
    event_tx: Option<broadcast::Sender<ExportEvent>>,
}

impl SlackLister {
    /// Build a lister for the workspace described by `slack`
    pub fn new(client: reqwest::Client, slack: &SlackConfig) -> Result<Self> {
        let base = Url::parse(&slack.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {}", slack.base_url, e),
            key: Some("slack.base_url".to_string()),
        })?;
        let mut endpoint = base.join(LIST_PATH).map_err(|e| Error::Config {
            message: format!("invalid listing endpoint: {}", e),
            key: Some("slack.base_url".to_string()),
        })?;

        if !slack.route.is_empty() {
            endpoint
                .query_pairs_mut()
                .append_pair("slack_route", &slack.route);
        }

        Ok(Self {
            client,
            endpoint,
            token: slack.token.clone(),
            cookie: slack.cookie.clone(),
            event_tx: None,
        })
    }

    /// Publish a [`ExportEvent::PageListed`] for every fetched page
    #[must_use]
    pub fn with_events(mut self, event_tx: broadcast::Sender<ExportEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Listing endpoint, including the routing query parameter
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Total number of emoji, read from a one-record page
    pub async fn count(&self, cancel: &CancellationToken) -> Result<usize> {
        let list = self
            .get_page(cancel, 1, 1)
            .await
            .map_err(|e| e.context("first list request"))?;

        Ok(list.paging.total)
    }

    /// Send every record of pages `1..=page_count(total)` to `sink`, in order
    ///
    /// Pages are fetched one after another. The first failing page ends the
    /// listing with its error; `sink` is left open for the caller to drop.
    /// Returns early without error if the receiving side has gone away.
    pub async fn list_all(
        &self,
        cancel: &CancellationToken,
        total: usize,
        sink: &mpsc::Sender<Listed>,
    ) -> Result<()> {
        let pages = page_count(total);

        for page in 1..=pages {
            tracing::info!(page, pages, "listing emoji page");

            let list = self
                .get_page(cancel, page, PAGE_SIZE)
                .await
                .map_err(|e| e.context(format!("list request for page #{page}")))?;

            let records = list.emoji.len();
            if let Some(tx) = &self.event_tx {
                tx.send(ExportEvent::PageListed { page, records }).ok();
            }

            for record in list.emoji {
                let sent = cancellable(cancel, async {
                    Ok(sink.send(Listed::Record(record)).await.is_ok())
                })
                .await?;

                if !sent {
                    tracing::debug!(page, "record receiver dropped, stopping listing");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    async fn get_page(
        &self,
        cancel: &CancellationToken,
        page: usize,
        count: usize,
    ) -> Result<ListResponse> {
        let form = [
            ("token", self.token.clone()),
            ("page", page.to_string()),
            ("count", count.to_string()),
        ];

        let mut request = self.client.post(self.endpoint.clone()).form(&form);
        if !self.cookie.is_empty() {
            request = request.header(reqwest::header::COOKIE, &self.cookie);
        }

        cancellable(cancel, async {
            let response = request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::Transport {
                    context: "do request".to_string(),
                    source: e,
                })?;

            let body = response.bytes().await.map_err(|e| Error::Transport {
                context: "read response body".to_string(),
                source: e,
            })?;

            let list: ListResponse = serde_json::from_slice(&body).map_err(|e| Error::Decode {
                context: "unmarshal response".to_string(),
                source: e,
            })?;

            if !list.ok {
                return Err(Error::Api {
                    context: "list response".to_string(),
                    error: list.error.unwrap_or_else(|| "unknown".to_string()),
                });
            }

            Ok(list)
        })
        .await
    }
}
