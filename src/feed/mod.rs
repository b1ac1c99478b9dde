//! Feed access for logfollow.
//!
//! This module provides the cursor and entry types and the two-step
//! (status, then entries) client used by the poll loop.

pub mod client;
pub mod http;
pub mod source;
pub mod types;

pub use client::FeedClient;
pub use http::HttpFeedSource;
pub use source::FeedSource;
pub use types::{FeedCursor, FeedPage, FeedStatus, FetchOutcome, LogEntry, Ordinal, Timestamp};
