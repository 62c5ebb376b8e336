//! Small helpers shared by the lister, store and exporter

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run `fut` unless `cancel` fires first
///
/// When the token is cancelled the future is dropped, which abandons any
/// in-flight HTTP request it was driving.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Extension of the last path segment of `url`, including the leading dot
///
/// Operates on the raw string: query strings and fragments are not stripped,
/// and a URL without a dot in its last segment yields `""`.
///
/// # Examples
///
/// ```
/// use emoji_export::utils::url_extension;
///
/// assert_eq!(url_extension("https://x/img.png"), ".png");
/// assert_eq!(url_extension("https://x/img"), "");
/// assert_eq!(url_extension("https://x/a.gif?v=2"), ".gif?v=2");
/// ```
#[must_use]
pub fn url_extension(url: &str) -> &str {
    for (i, c) in url.char_indices().rev() {
        match c {
            '/' => break,
            '.' => return &url[i..],
            _ => {}
        }
    }
    ""
}

/// Whether `url` is an absolute http(s) URL that can be downloaded
pub fn is_downloadable(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}
