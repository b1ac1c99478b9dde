//! logfollow - follow a log-serving backend into a live view
//!
//! Polls a cheap status endpoint, fetches new entries only when something
//! changed, splices them into an ordered view and caps its length.

pub mod config;
pub mod datetime;
pub mod error;
pub mod feed;
pub mod follow;
pub mod logging;
pub mod view;

pub use config::Config;
pub use error::{FollowError, Result};
pub use feed::{
    FeedClient, FeedCursor, FeedPage, FeedSource, FeedStatus, FetchOutcome, HttpFeedSource,
    LogEntry, Ordinal, Timestamp,
};
pub use follow::{
    ControlFlag, CycleReport, PollControl, PollScheduler, SchedulerOptions, SchedulerState, Timer,
    TokioTimer,
};
pub use view::{FragmentSink, MemorySink, RenderedSequence, TerminalSink, ViewOp};
