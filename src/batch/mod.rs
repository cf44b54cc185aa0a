//! Sequential batch watermarking on a background worker.
//!
//! A batch is a list of [`BatchJob`]s sharing one watermark spec. The
//! [`BatchScheduler`] runs them in order, reports through a
//! [`BatchObserver`], and can be cancelled between jobs.

pub mod job;
pub mod observer;
pub mod scheduler;

pub use job::{BatchJob, BatchOptions, SAME_DIR_SUFFIX};
pub use observer::{BatchObserver, BatchSummary, FnObserver, NoopObserver};
pub use scheduler::{
    BatchError, BatchScheduler, BatchState, CancelOutcome, DEFAULT_CANCEL_TIMEOUT,
};
