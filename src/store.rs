//! Catalog store: content-addressed image files plus an append-only catalog
//!
//! Every stored emoji produces two artifacts inside the export directory:
//! - the image bytes, under a name derived from the SHA-256 of its URL
//! - one JSON line in `emoji.catalog` pairing that name with the full record
//!
//! The catalog is truncated when the store is opened, so each run starts a
//! fresh catalog. Image files from earlier runs are overwritten when their URL
//! hashes to the same name and otherwise left in place.

use crate::error::{Error, Result};
use crate::types::{CatalogEntry, EmojiRecord};
use crate::utils::url_extension;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Name of the catalog file inside the export directory
pub const CATALOG_FILE_NAME: &str = "emoji.catalog";

/// Suffix of in-progress image files, renamed away once fully written
const PARTIAL_SUFFIX: &str = ".part";

/// Generated file name for an image URL
///
/// The name is the lowercase hex SHA-256 of the URL, a dot, and the URL's
/// extension without its own leading dot. A URL without an extension yields a
/// name ending in a bare dot (`<hash>.`), and query strings are carried into
/// the extension as-is.
///
/// # Examples
///
/// ```
/// use emoji_export::store::file_name;
///
/// let name = file_name("https://x/img.png");
/// assert_eq!(name.len(), 64 + ".png".len());
/// assert!(name.ends_with(".png"));
/// assert_eq!(name, file_name("https://x/img.png"));
/// ```
#[must_use]
pub fn file_name(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = hasher.finalize();

    let ext = url_extension(url);
    let ext = ext.strip_prefix('.').unwrap_or(ext);

    format!("{:x}.{}", hash, ext)
}

/// Exclusive owner of the export directory and its catalog handle
#[derive(Debug)]
pub struct Store {
    directory: PathBuf,
    catalog_path: PathBuf,
    catalog: File,
}

impl Store {
    /// Open a store over an existing directory, truncating any prior catalog
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();

        let metadata = tokio::fs::metadata(&directory)
            .await
            .map_err(|e| Error::fs("check path", &directory, e))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(directory));
        }

        let catalog_path = directory.join(CATALOG_FILE_NAME);
        let catalog = File::create(&catalog_path)
            .await
            .map_err(|e| Error::fs("create catalog file", &catalog_path, e))?;

        tracing::debug!(catalog = %catalog_path.display(), "opened catalog");

        Ok(Self {
            directory,
            catalog_path,
            catalog,
        })
    }

    /// Export directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of `emoji.catalog`
    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Write `body` under the record's generated name, then append its catalog line
    ///
    /// `body` yields the image in chunks; its errors are returned unchanged, so
    /// a network failure mid-download stays a transport error. Only local write
    /// failures become [`Error::Filesystem`].
    ///
    /// Returns the generated file name. The image is streamed into a `.part`
    /// file and renamed into place only once complete, so an interrupted copy
    /// never leaves a truncated image under the generated name. The rename and
    /// the catalog append are two steps: a failure or cancellation between
    /// them leaves a complete image with no catalog line.
    pub async fn store_item<S, B>(&mut self, record: &EmojiRecord, body: S) -> Result<String>
    where
        S: Stream<Item = Result<B>> + Unpin,
        B: AsRef<[u8]>,
    {
        let name = file_name(&record.url);

        self.write_to_file(&name, body).await?;
        self.append_to_catalog(&name, record).await?;

        Ok(name)
    }

    /// Remove the in-progress file left behind by an interrupted [`Store::store_item`]
    pub async fn discard_partial(&self, record: &EmojiRecord) -> Result<()> {
        let partial = self.partial_path(&file_name(&record.url));
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => {
                tracing::debug!(path = %partial.display(), "removed partial file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::fs("remove partial file", partial, e)),
        }
    }

    /// Flush and release the catalog handle
    pub async fn close(mut self) -> Result<()> {
        self.catalog
            .flush()
            .await
            .map_err(|e| Error::fs("flush catalog", &self.catalog_path, e))?;
        self.catalog
            .sync_all()
            .await
            .map_err(|e| Error::fs("sync catalog", &self.catalog_path, e))?;

        tracing::debug!(catalog = %self.catalog_path.display(), "closed catalog");
        Ok(())
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}{PARTIAL_SUFFIX}"))
    }

    async fn write_to_file<S, B>(&self, name: &str, body: S) -> Result<()>
    where
        S: Stream<Item = Result<B>> + Unpin,
        B: AsRef<[u8]>,
    {
        let path = self.directory.join(name);
        let partial = self.partial_path(name);

        let written = match write_chunks(&partial, body).await {
            Ok(n) => n,
            Err(e) => {
                tokio::fs::remove_file(&partial).await.ok();
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| Error::fs("rename file to", &path, e))?;

        tracing::trace!(path = %path.display(), bytes = written, "wrote image");
        Ok(())
    }

    async fn append_to_catalog(&mut self, name: &str, record: &EmojiRecord) -> Result<()> {
        let entry = CatalogEntry {
            file_name: name.to_string(),
            emoji: record.clone(),
        };

        let mut line = serde_json::to_vec(&entry).map_err(Error::Serialization)?;
        line.push(b'\n');

        self.catalog
            .write_all(&line)
            .await
            .map_err(|e| Error::fs("write catalog entry", &self.catalog_path, e))?;
        self.catalog
            .flush()
            .await
            .map_err(|e| Error::fs("flush catalog", &self.catalog_path, e))?;

        Ok(())
    }
}

/// Stream `body` into a freshly created file at `path`, returning the byte count
async fn write_chunks<S, B>(path: &Path, mut body: S) -> Result<u64>
where
    S: Stream<Item = Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut file = File::create(path)
        .await
        .map_err(|e| Error::fs("create file", path, e))?;

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        file.write_all(bytes)
            .await
            .map_err(|e| Error::fs("write to file", path, e))?;
        written += bytes.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::fs("flush file", path, e))?;

    Ok(written)
}
