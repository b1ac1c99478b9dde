//! Feed client: cheap status check, full fetch only when something changed.
//!
//! The client holds no cursor of its own; the caller passes the current
//! cursor in and applies the returned one.

use tracing::{debug, warn};

use crate::error::{FollowError, Result};
use crate::feed::source::FeedSource;
use crate::feed::types::{FeedCursor, FetchOutcome};

/// Two-step feed client over a [`FeedSource`].
pub struct FeedClient<S> {
    source: S,
}

impl<S: FeedSource> FeedClient<S> {
    /// Create a client over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Access the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Check for newer data and fetch it, absorbing failures as `NoChange`.
    pub async fn check_and_fetch(&self, cursor: &FeedCursor) -> FetchOutcome {
        match self.try_check_and_fetch(cursor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Feed check failed, treating as no change: {}", e);
                FetchOutcome::NoChange
            }
        }
    }

    /// Check for newer data and fetch it, reporting failures.
    ///
    /// Entries at or below the cursor are dropped; the rest are returned in
    /// id order.
    pub async fn try_check_and_fetch(&self, cursor: &FeedCursor) -> Result<FetchOutcome> {
        let status = self.source.status(cursor).await?;

        if !cursor.is_behind(&status) {
            debug!(
                last_id = status.last_id,
                cursor_id = cursor.last_seen_id,
                "No new entries"
            );
            return Ok(FetchOutcome::NoChange);
        }

        let page = self.source.entries(cursor).await?;

        if page.last_id <= cursor.last_seen_id {
            return Err(FollowError::MalformedResponse(format!(
                "entries response last_id {} does not advance past cursor {}",
                page.last_id, cursor.last_seen_id
            )));
        }

        let mut entries: Vec<_> = page
            .log_entries
            .into_iter()
            .filter(|entry| entry.id > cursor.last_seen_id)
            .collect();
        entries.sort_by_key(|entry| entry.id);

        let newest_entry_id = entries.last().map_or(0, |entry| entry.id);
        let newest_entry_time = entries.iter().map(|e| e.sort_key).max().unwrap_or(0);
        let next = cursor
            .advanced_to(page.last_id, page.last_modified)
            .advanced_to(newest_entry_id, newest_entry_time);

        debug!(
            count = entries.len(),
            last_id = next.last_seen_id,
            "Fetched new entries"
        );

        Ok(FetchOutcome::Update {
            entries,
            cursor: next,
        })
    }
}
