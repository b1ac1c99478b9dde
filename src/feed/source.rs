//! Backend abstraction for the two-step feed query.

use async_trait::async_trait;

use crate::feed::types::{FeedCursor, FeedPage, FeedStatus};
use crate::Result;

/// A log-serving backend.
///
/// `status` is the cheap freshness check; `entries` is the heavier query
/// returning the entries newer than the cursor. Any search filter is part
/// of the source itself, fixed when it is built.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Query the newest id and modification time.
    async fn status(&self, cursor: &FeedCursor) -> Result<FeedStatus>;

    /// Fetch entries newer than the cursor.
    async fn entries(&self, cursor: &FeedCursor) -> Result<FeedPage>;
}
