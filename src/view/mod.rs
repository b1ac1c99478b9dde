//! Live view for logfollow.
//!
//! `sequence` owns ordering and retention; `sink` mirrors the resulting
//! operations to an output.

pub mod sequence;
pub mod sink;

pub use sequence::{RenderedSequence, ViewOp};
pub use sink::{strip_html, FragmentSink, MemorySink, TerminalSink};
