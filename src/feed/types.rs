//! Feed types for logfollow.

use serde::{Deserialize, Serialize};

/// Strictly increasing identifier assigned to entries by the producer.
pub type Ordinal = u64;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// How much of the feed has been consumed.
///
/// Both fields only ever move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCursor {
    /// Id of the newest entry seen.
    pub last_seen_id: Ordinal,
    /// Modification time of the newest entry seen.
    pub last_modified: Timestamp,
}

impl FeedCursor {
    /// Create a cursor.
    pub fn new(last_seen_id: Ordinal, last_modified: Timestamp) -> Self {
        Self {
            last_seen_id,
            last_modified,
        }
    }

    /// Whether the backend reports entries this cursor has not consumed.
    pub fn is_behind(&self, status: &FeedStatus) -> bool {
        status.last_id > self.last_seen_id
    }

    /// Field-wise maximum of this cursor and the given markers.
    pub fn advanced_to(&self, last_id: Ordinal, last_modified: Timestamp) -> Self {
        Self {
            last_seen_id: self.last_seen_id.max(last_id),
            last_modified: self.last_modified.max(last_modified),
        }
    }
}

/// A log entry as delivered by the backend.
///
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Producer-assigned id.
    pub id: Ordinal,
    /// Display ordering key (the entry's log time).
    #[serde(rename = "log_time")]
    pub sort_key: Timestamp,
    /// Pre-rendered markup for the entry.
    #[serde(rename = "html")]
    pub fragment: String,
}

impl LogEntry {
    /// Create a new entry.
    pub fn new(id: Ordinal, sort_key: Timestamp, fragment: impl Into<String>) -> Self {
        Self {
            id,
            sort_key,
            fragment: fragment.into(),
        }
    }
}

/// Response to the cheap status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStatus {
    /// Newest entry id matching the filter.
    pub last_id: Ordinal,
    /// Newest modification time matching the filter.
    pub last_modified: Timestamp,
}

/// Response to the full entries query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    /// Newest entry id matching the filter.
    pub last_id: Ordinal,
    /// Newest modification time matching the filter.
    pub last_modified: Timestamp,
    /// Entries newer than the cursor carried by the request.
    pub log_entries: Vec<LogEntry>,
}

/// Result of one check-and-fetch round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The backend had newer data.
    Update {
        /// New entries in arrival (id ascending) order.
        entries: Vec<LogEntry>,
        /// Cursor to use for the next round; `last_seen_id` strictly greater
        /// than the one the round started from.
        cursor: FeedCursor,
    },
    /// Nothing newer, or the round failed.
    NoChange,
}

impl FetchOutcome {
    /// Whether this is an update.
    pub fn is_update(&self) -> bool {
        matches!(self, FetchOutcome::Update { .. })
    }
}
