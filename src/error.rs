//! Error types for emoji-export
//!
//! Every failure is wrapped with the operation that produced it and propagated
//! upward. Nothing in the export path retries: the first error ends the run.
//!
//! The taxonomy is:
//! - transport failures talking to the remote API ([`Error::Transport`])
//! - malformed or rejected responses ([`Error::Decode`], [`Error::Api`])
//! - local filesystem failures ([`Error::Filesystem`], [`Error::NotADirectory`])
//! - external cancellation ([`Error::Cancelled`])

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for emoji-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for emoji-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "slack.token")
        key: Option<String>,
    },

    /// Network or connection failure, including non-success HTTP statuses
    #[error("{context}: {source}")]
    Transport {
        /// The operation that was being performed
        context: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// Response body could not be parsed into the expected shape
    #[error("{context}: {source}")]
    Decode {
        /// The operation that was being performed
        context: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The listing endpoint answered with `ok: false`
    #[error("{context}: API returned error {error:?}")]
    Api {
        /// The operation that was being performed
        context: String,
        /// Error code reported by the API (e.g. "invalid_auth")
        error: String,
    },

    /// File create, write, rename or stat failure
    #[error("{context} {}: {source}", .path.display())]
    Filesystem {
        /// The operation that was being performed
        context: String,
        /// The path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Store target exists but is not a directory
    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Catalog entry could not be serialized
    #[error("serialize catalog entry: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Run aborted by the external cancellation signal
    #[error("export cancelled")]
    Cancelled,

    /// Failure surfaced from the background listing task
    #[error("list request: {0}")]
    List(#[source] Box<Error>),

    /// Outer wrapping that names the failed step
    #[error("{context}: {source}")]
    Context {
        /// The step that failed
        context: String,
        /// The wrapped error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a [`Error::Filesystem`] for `path`
    pub(crate) fn fs(
        context: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    /// Wrap `self` with the name of the step that produced it
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or anything it wraps) is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::List(inner) => inner.is_cancelled(),
            Error::Context { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Short machine-readable category, used in structured log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport { .. } => "transport_error",
            Error::Decode { .. } | Error::Api { .. } => "decode_error",
            Error::Filesystem { .. } | Error::NotADirectory(_) | Error::Serialization(_) => {
                "filesystem_error"
            }
            Error::Cancelled => "cancelled",
            Error::List(inner) => inner.error_code(),
            Error::Context { source, .. } => source.error_code(),
        }
    }
}
