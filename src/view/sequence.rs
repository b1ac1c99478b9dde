//! Ordered, bounded view of log entries.
//!
//! Entries are kept newest first: index 0 holds the largest sort key.
//! Every mutation is reported as a [`ViewOp`] so a renderer can mirror it
//! without re-rendering untouched entries.

use std::collections::HashSet;

use tracing::debug;

use crate::feed::{LogEntry, Ordinal};

/// A single change to the rendered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    /// `entry` was inserted so that it now sits at `index` (0 = newest).
    Insert {
        /// Id of the inserted entry.
        id: Ordinal,
        /// Position after insertion.
        index: usize,
        /// The inserted entry.
        entry: LogEntry,
    },
    /// The entry with `id` was dropped from the oldest end.
    Remove {
        /// Id of the removed entry.
        id: Ordinal,
    },
}

/// Entries sorted by descending sort key, with an id index.
#[derive(Debug, Clone, Default)]
pub struct RenderedSequence {
    entries: Vec<LogEntry>,
    ids: HashSet<Ordinal>,
}

impl RenderedSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from an initial full render, capped at `max_entries`.
    ///
    /// Entries may be given in any order.
    pub fn seed(entries: Vec<LogEntry>, max_entries: usize) -> Self {
        let mut sequence = Self::new();
        let mut entries = entries;
        entries.sort_by_key(|entry| entry.id);
        sequence.merge(entries);
        sequence.trim(max_entries);
        sequence
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Ids, newest first.
    pub fn ids(&self) -> Vec<Ordinal> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Whether an entry with this id is held.
    pub fn contains(&self, id: Ordinal) -> bool {
        self.ids.contains(&id)
    }

    /// Whether adjacent entries are in non-increasing sort key order.
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].sort_key >= pair[1].sort_key)
    }

    /// Splice new entries into place.
    ///
    /// Each entry is inserted in front of the first held entry, scanning
    /// from the newest end, whose sort key is not newer than its own. An
    /// entry sharing a sort key with held entries therefore lands above
    /// them. Entries whose id is already held are skipped.
    pub fn merge(&mut self, new_entries: impl IntoIterator<Item = LogEntry>) -> Vec<ViewOp> {
        let mut ops = Vec::new();

        for entry in new_entries {
            if self.ids.contains(&entry.id) {
                debug!(id = entry.id, "Skipping duplicate entry");
                continue;
            }

            let index = self.insertion_point(&entry);
            self.ids.insert(entry.id);
            self.entries.insert(index, entry.clone());
            ops.push(ViewOp::Insert {
                id: entry.id,
                index,
                entry,
            });
        }

        ops
    }

    /// Drop everything beyond the `max_entries` newest entries.
    ///
    /// Removals are reported oldest first.
    pub fn trim(&mut self, max_entries: usize) -> Vec<ViewOp> {
        if self.entries.len() <= max_entries {
            return Vec::new();
        }

        let mut removed = self.entries.split_off(max_entries);
        removed.reverse();

        removed
            .into_iter()
            .map(|entry| {
                self.ids.remove(&entry.id);
                ViewOp::Remove { id: entry.id }
            })
            .collect()
    }

    fn insertion_point(&self, entry: &LogEntry) -> usize {
        self.entries
            .iter()
            .position(|held| held.sort_key <= entry.sort_key)
            .unwrap_or(self.entries.len())
    }
}
