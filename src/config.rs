//! Configuration types for emoji-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Main configuration for an export run
///
/// Mirrors the on-disk JSON layout:
///
/// ```json
/// {
///   "directory": "./emoji",
///   "slack": { "token": "xoxs-...", "route": "T0123", "cookie": "d=..." }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Export directory (must already exist)
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Remote workspace settings
    #[serde(default)]
    pub slack: SlackConfig,
}

/// Slack workspace connection settings
///
/// `token`, `route` and `cookie` are opaque values passed through to every
/// listing request unmodified.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlackConfig {
    /// API token sent as the `token` form field
    #[serde(default)]
    pub token: String,

    /// Routing hint sent as the `slack_route` query parameter
    #[serde(default)]
    pub route: String,

    /// Raw `Cookie` header value (omitted when empty)
    #[serde(default)]
    pub cookie: String,

    /// Base URL of the workspace (default: "https://dd.slack.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (None = rely on cancellation only)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            slack: SlackConfig::default(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            route: String::new(),
            cookie: String::new(),
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl SlackConfig {
    /// Per-request timeout, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Read and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| Error::Config {
            message: format!("read config file {}: {}", path.display(), e),
            key: None,
        })?;

        let config: Config = serde_json::from_slice(&content).map_err(|e| Error::Config {
            message: format!("unmarshal config {}: {}", path.display(), e),
            key: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the settings the exporter cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.slack.token.trim().is_empty() {
            return Err(Error::Config {
                message: "slack token must not be empty".to_string(),
                key: Some("slack.token".to_string()),
            });
        }

        if let Err(e) = url::Url::parse(&self.slack.base_url) {
            return Err(Error::Config {
                message: format!("invalid base URL {:?}: {}", self.slack.base_url, e),
                key: Some("slack.base_url".to_string()),
            });
        }

        if self.slack.request_timeout_secs == Some(0) {
            return Err(Error::Config {
                message: "request timeout must be at least one second".to_string(),
                key: Some("slack.request_timeout_secs".to_string()),
            });
        }

        Ok(())
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./emoji")
}

fn default_base_url() -> String {
    "https://dd.slack.com".to_string()
}
