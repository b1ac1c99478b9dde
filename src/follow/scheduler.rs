//! Poll scheduler for logfollow.
//!
//! Drives the cycle fetch -> merge -> trim -> reschedule-or-stop as an
//! explicit state machine:
//!
//! ```text
//! Idle -> Polling -> (Merging ->) Waiting -> Polling -> ...
//!                                   \-> Stopped -> (resume) -> Polling
//! ```
//!
//! Only `Polling` suspends on the network and `Waiting` on the timer, and
//! each cycle completes before the next fetch starts, so at most one fetch
//! is ever in flight.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::FollowConfig;
use crate::feed::{FeedClient, FeedCursor, FeedSource, FetchOutcome, LogEntry};
use crate::follow::control::ControlFlag;
use crate::follow::timer::{Timer, TokioTimer};
use crate::view::{FragmentSink, RenderedSequence, ViewOp};
use crate::FollowError;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, no cycle run yet.
    Idle,
    /// Next step queries the backend.
    Polling,
    /// Next step splices a fetched update into the view.
    Merging,
    /// Next step decides whether to poll again.
    Waiting,
    /// Following is off; leaves only through [`PollScheduler::resume`].
    Stopped,
}

/// Tunables for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Delay between cycles.
    pub delay: Duration,
    /// Retention cap for the view.
    pub max_entries: usize,
    /// Consecutive failed cycles before a stall warning.
    pub max_consecutive_errors: u32,
}

impl From<&FollowConfig> for SchedulerOptions {
    fn from(config: &FollowConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            max_entries: config.max_entries,
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from(&FollowConfig::default())
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether the backend reported newer data.
    pub updated: bool,
    /// Whether the fetch failed and was treated as no change.
    pub failed: bool,
    /// Entries inserted into the view.
    pub inserted: usize,
    /// Entries trimmed from the view.
    pub removed: usize,
}

/// Fetched data waiting for the merge step.
struct PendingUpdate {
    entries: Vec<LogEntry>,
    cursor: FeedCursor,
}

/// Poll loop over a feed source, a view sink and a timer.
pub struct PollScheduler<S, K, T = TokioTimer> {
    client: FeedClient<S>,
    sink: K,
    timer: T,
    control: ControlFlag,
    options: SchedulerOptions,
    cursor: FeedCursor,
    view: RenderedSequence,
    state: SchedulerState,
    pending: Option<PendingUpdate>,
    report: CycleReport,
    consecutive_failures: u32,
}

impl<S, K> PollScheduler<S, K, TokioTimer>
where
    S: FeedSource,
    K: FragmentSink,
{
    /// Create a scheduler with an empty view and a zero cursor.
    pub fn new(
        client: FeedClient<S>,
        sink: K,
        control: ControlFlag,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            client,
            sink,
            timer: TokioTimer,
            control,
            options,
            cursor: FeedCursor::default(),
            view: RenderedSequence::new(),
            state: SchedulerState::Idle,
            pending: None,
            report: CycleReport::default(),
            consecutive_failures: 0,
        }
    }
}

impl<S, K, T> PollScheduler<S, K, T>
where
    S: FeedSource,
    K: FragmentSink,
    T: Timer,
{
    /// Replace the timer.
    pub fn with_timer<T2: Timer>(self, timer: T2) -> PollScheduler<S, K, T2> {
        PollScheduler {
            client: self.client,
            sink: self.sink,
            timer,
            control: self.control,
            options: self.options,
            cursor: self.cursor,
            view: self.view,
            state: self.state,
            pending: self.pending,
            report: self.report,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Seed the cursor.
    pub fn with_cursor(mut self, cursor: FeedCursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Seed the view from an initial full render.
    ///
    /// The seeded entries are assumed to be rendered already; nothing is
    /// sent to the sink.
    pub fn with_view(mut self, view: RenderedSequence) -> Self {
        self.view = view;
        self
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Current cursor.
    pub fn cursor(&self) -> FeedCursor {
        self.cursor
    }

    /// Current view.
    pub fn view(&self) -> &RenderedSequence {
        &self.view
    }

    /// The sink receiving view operations.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Failed cycles since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Leave `Idle` and begin polling.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Idle {
            info!(
                "Following started (delay: {} ms, max entries: {})",
                self.options.delay.as_millis(),
                self.options.max_entries
            );
            self.transition(SchedulerState::Polling);
        }
    }

    /// Leave `Stopped` and begin polling again.
    ///
    /// Returns `false` if the scheduler was not stopped.
    pub fn resume(&mut self) -> bool {
        if self.state != SchedulerState::Stopped {
            return false;
        }
        info!("Following resumed");
        self.transition(SchedulerState::Polling);
        true
    }

    /// Perform exactly one state transition and return the new state.
    ///
    /// In `Stopped` this does nothing.
    pub async fn step(&mut self) -> SchedulerState {
        match self.state {
            SchedulerState::Idle => self.start(),
            SchedulerState::Polling => self.poll().await,
            SchedulerState::Merging => self.merge(),
            SchedulerState::Waiting => self.wait().await,
            SchedulerState::Stopped => {}
        }
        self.state
    }

    /// Run one full cycle: from `Polling` through the reschedule decision.
    ///
    /// Starts the scheduler if it is idle. Returns an empty report without
    /// doing anything if it is stopped.
    pub async fn run_cycle(&mut self) -> CycleReport {
        if self.state == SchedulerState::Idle {
            self.start();
        }
        if self.state == SchedulerState::Stopped {
            return CycleReport::default();
        }

        self.report = CycleReport::default();
        loop {
            match self.step().await {
                SchedulerState::Polling | SchedulerState::Stopped => break,
                _ => {}
            }
        }
        std::mem::take(&mut self.report)
    }

    /// Run cycles until the control flag stops the scheduler.
    pub async fn run_until_stopped(&mut self) {
        while self.state != SchedulerState::Stopped {
            self.run_cycle().await;
        }
    }

    /// Run forever, waiting on the control flag while stopped.
    ///
    /// Returns once the scheduler is stopped and the control side is gone.
    pub async fn run(&mut self) {
        loop {
            self.run_until_stopped().await;
            if !self.control.wait_active().await {
                info!("Follow control closed, poll loop exiting");
                return;
            }
            self.resume();
        }
    }

    async fn poll(&mut self) {
        match self.client.try_check_and_fetch(&self.cursor).await {
            Ok(FetchOutcome::Update { entries, cursor }) => {
                self.record_success();
                self.report.updated = true;
                self.pending = Some(PendingUpdate { entries, cursor });
                self.transition(SchedulerState::Merging);
            }
            Ok(FetchOutcome::NoChange) => {
                self.record_success();
                self.transition(SchedulerState::Waiting);
            }
            Err(e) => {
                self.record_failure(&e);
                self.transition(SchedulerState::Waiting);
            }
        }
    }

    fn merge(&mut self) {
        if let Some(update) = self.pending.take() {
            let inserted = self.view.merge(update.entries);
            let removed = self.view.trim(self.options.max_entries);
            self.report.inserted += inserted.len();
            self.report.removed += removed.len();
            self.cursor = self
                .cursor
                .advanced_to(update.cursor.last_seen_id, update.cursor.last_modified);

            if !inserted.is_empty() {
                info!(
                    "{} new entr{} (last id {})",
                    inserted.len(),
                    if inserted.len() == 1 { "y" } else { "ies" },
                    self.cursor.last_seen_id
                );
            }
            self.emit(inserted.iter().chain(removed.iter()));
        }
        self.transition(SchedulerState::Waiting);
    }

    async fn wait(&mut self) {
        if !self.control.is_active() {
            self.stop();
            return;
        }

        self.timer.sleep(self.options.delay).await;

        if self.control.is_active() {
            self.transition(SchedulerState::Polling);
        } else {
            self.stop();
        }
    }

    fn stop(&mut self) {
        info!("Following stopped");
        self.transition(SchedulerState::Stopped);
    }

    fn emit<'a>(&mut self, ops: impl Iterator<Item = &'a ViewOp>) {
        for op in ops {
            if let Err(e) = self.sink.apply(op) {
                warn!("Failed to render view update: {}", e);
            }
        }
    }

    fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            info!(
                "Feed recovered after {} failed poll(s)",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, error: &FollowError) {
        self.consecutive_failures += 1;
        self.report.failed = true;
        warn!("Poll failed, treating as no change: {}", error);

        if self.consecutive_failures == self.options.max_consecutive_errors {
            warn!(
                "Feed stalled: {} consecutive failed polls, still retrying every {} ms",
                self.consecutive_failures,
                self.options.delay.as_millis()
            );
        }
    }

    fn transition(&mut self, to: SchedulerState) {
        debug!(from = ?self.state, to = ?to, "Scheduler transition");
        self.state = to;
    }
}
