//! Batch progress callbacks.
//!
//! All callbacks run on the batch worker thread.

use std::path::Path;

/// Final report of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Jobs taken off the queue, whether they succeeded or failed
    pub processed_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
    pub cancelled: bool,
    /// True when the run was not cancelled
    pub success: bool,
}

impl BatchSummary {
    pub fn succeeded_count(&self) -> usize {
        self.processed_count - self.failed_count
    }
}

/// Receives batch events. Every method defaults to a no-op.
///
/// Callbacks run on the worker thread, which still owns the run. Calling
/// [`BatchScheduler::wait`] from a callback therefore never returns, and
/// [`BatchScheduler::cancel`] blocks until its timeout expires.
///
/// [`BatchScheduler::wait`]: super::BatchScheduler::wait
/// [`BatchScheduler::cancel`]: super::BatchScheduler::cancel
pub trait BatchObserver: Send + Sync {
    /// A job was taken off the queue and finished, successfully or not.
    /// `percent` is `floor(processed / total * 100)` and reaches 100 on
    /// the last job of a run that was not cancelled. For a failed job it
    /// follows the matching `on_error`.
    fn on_progress(&self, _percent: u8, _path: &Path) {}

    /// The run finished or was cancelled. Called exactly once per run.
    fn on_complete(&self, _summary: &BatchSummary) {}

    /// A job failed; the batch continues with the next one.
    fn on_error(&self, _message: &str, _path: &Path) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

type ProgressFn = Box<dyn Fn(u8, &Path) + Send + Sync>;
type CompleteFn = Box<dyn Fn(&BatchSummary) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&str, &Path) + Send + Sync>;

/// Observer built from closures.
///
/// ```
/// use photomark::batch::FnObserver;
///
/// let observer = FnObserver::new()
///     .on_progress(|percent, path| println!("{percent}% {}", path.display()))
///     .on_error(|message, path| eprintln!("{}: {message}", path.display()));
/// ```
#[derive(Default)]
pub struct FnObserver {
    progress: Option<ProgressFn>,
    complete: Option<CompleteFn>,
    error: Option<ErrorFn>,
}

impl FnObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl Fn(u8, &Path) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn(&BatchSummary) + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&str, &Path) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for FnObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver")
            .field("progress", &self.progress.is_some())
            .field("complete", &self.complete.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl BatchObserver for FnObserver {
    fn on_progress(&self, percent: u8, path: &Path) {
        if let Some(f) = &self.progress {
            f(percent, path);
        }
    }

    fn on_complete(&self, summary: &BatchSummary) {
        if let Some(f) = &self.complete {
            f(summary);
        }
    }

    fn on_error(&self, message: &str, path: &Path) {
        if let Some(f) = &self.error {
            f(message, path);
        }
    }
}
