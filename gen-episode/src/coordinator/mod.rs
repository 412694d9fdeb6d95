//! Coordinator for parallel TTS processing.
//!
//! The dispatcher fans chunks out to the synthesis worker; the report module
//! keeps the per-run bookkeeping.

pub mod dispatcher;
pub mod report;

pub use dispatcher::{DispatchProgress, ParallelDispatcher, default_concurrency};
pub use report::{DispatchSummary, RunReport};
