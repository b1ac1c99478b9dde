//! Poll loop for logfollow.
//!
//! This module provides the follow control flag, the timer abstraction and
//! the scheduler state machine that ties the feed client to the view.

pub mod control;
pub mod scheduler;
pub mod timer;

pub use control::{ControlFlag, PollControl};
pub use scheduler::{CycleReport, PollScheduler, SchedulerOptions, SchedulerState};
pub use timer::{Timer, TokioTimer};
