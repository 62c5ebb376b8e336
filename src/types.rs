//! Core types for emoji-export

use serde::{Deserialize, Serialize};

/// One custom emoji as reported by the admin listing endpoint
///
/// Field names match the API's JSON and are written to the catalog verbatim.
/// Every field defaults when absent so sparse records still decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiRecord {
    /// Emoji name, unique within the workspace
    #[serde(default)]
    pub name: String,
    /// 1 when this emoji is an alias of another, 0 otherwise
    #[serde(default)]
    pub is_alias: i32,
    /// Target emoji name for aliases
    #[serde(default)]
    pub alias_for: String,
    /// Image source URL
    #[serde(default)]
    pub url: String,
    /// Owning team
    #[serde(default)]
    pub team_id: String,
    /// Uploading user
    #[serde(default)]
    pub user_id: String,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created: i64,
    /// Flagged as broken by the workspace
    #[serde(default)]
    pub is_bad: bool,
    /// Display name of the uploading user
    #[serde(default)]
    pub user_display_name: String,
    /// Avatar hash of the uploading user
    #[serde(default)]
    pub avatar_hash: String,
    /// Whether the listing user may delete this emoji
    #[serde(default)]
    pub can_delete: bool,
    /// Alternative names
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl EmojiRecord {
    /// Whether the API marked this record as an alias
    pub fn is_alias(&self) -> bool {
        self.is_alias != 0
    }
}

/// Pagination block of a listing response
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Page size used for this response
    #[serde(default)]
    pub count: usize,
    /// Total number of emoji in the workspace
    #[serde(default)]
    pub total: usize,
    /// Page number of this response (1-based)
    #[serde(default)]
    pub page: usize,
    /// Number of pages at this page size
    #[serde(default)]
    pub pages: usize,
}

/// Envelope returned by `emoji.adminList`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListResponse {
    /// False when the API rejected the request
    pub ok: bool,
    /// Error code accompanying `ok: false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Records on this page
    #[serde(default)]
    pub emoji: Vec<EmojiRecord>,
    /// Pagination metadata
    #[serde(default)]
    pub paging: Paging,
}

/// One line of `emoji.catalog`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Generated image file name inside the export directory
    pub file_name: String,
    /// The record the image was downloaded for
    pub emoji: EmojiRecord,
}

/// Export run state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    /// Constructed, not started
    Init,
    /// Fetching the total emoji count
    Counting,
    /// Listing in the background while downloading in the foreground
    Listing,
    /// All records consumed, stopping the listing task
    Draining,
    /// Finished successfully
    Done,
    /// Aborted by an error
    Failed,
    /// Aborted by the cancellation signal
    Cancelled,
}

impl ExportState {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportState::Done | ExportState::Failed | ExportState::Cancelled
        )
    }
}

impl std::fmt::Display for ExportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExportState::Init => "init",
            ExportState::Counting => "counting",
            ExportState::Listing => "listing",
            ExportState::Draining => "draining",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
            ExportState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Event emitted during an export run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    /// Run moved to a new state
    StateChanged {
        /// The new state
        state: ExportState,
    },

    /// Total emoji count obtained
    Counted {
        /// Number of emoji the API reported
        total: usize,
    },

    /// One listing page fetched
    PageListed {
        /// Page number (1-based)
        page: usize,
        /// Records on the page
        records: usize,
    },

    /// Image and catalog line written
    Stored {
        /// Emoji name
        name: String,
        /// Generated file name
        file_name: String,
    },

    /// Record passed over without downloading
    Skipped {
        /// Emoji name
        name: String,
        /// Why it was skipped
        reason: String,
    },
}

/// Outcome of a successful export run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Total the API reported up front
    pub expected: usize,
    /// Records stored on disk
    pub stored: usize,
    /// Records skipped for lack of a downloadable URL
    pub skipped: usize,
}
