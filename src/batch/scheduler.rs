//! Background batch scheduler.
//!
//! One worker thread per run drains the job queue in submission order.
//! Cancellation is cooperative: the worker checks the run's cancel flag
//! before each job and never aborts a job midway.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use uuid::Uuid;

use super::job::{BatchJob, BatchOptions};
use super::observer::{BatchObserver, BatchSummary};
use crate::watermark::{WatermarkSpec, Watermarker};

/// How long `cancel` waits for the worker before forcing the state back
/// to idle.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("a batch is already being processed")]
    AlreadyRunning,

    #[error("no images to process")]
    NoJobs,

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start batch worker: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Processing,
}

/// Result of [`BatchScheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing was running
    NotRunning,
    /// The worker stopped within the timeout
    Stopped(BatchSummary),
    /// The worker was still busy when the timeout ran out; the scheduler
    /// was reset to idle anyway
    TimedOut,
}

#[derive(Debug)]
struct RunState {
    processing: bool,
    /// Bumped on every start, so a late worker cannot reset a newer run
    generation: u64,
    cancel: Arc<AtomicBool>,
    run_id: Option<Uuid>,
    last_summary: Option<(u64, BatchSummary)>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<RunState>,
    finished: Condvar,
}

/// Runs batches of watermark jobs on a background thread.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    watermarker: Watermarker,
    cancel_timeout: Duration,
    shared: Arc<Shared>,
}

impl BatchScheduler {
    pub fn new(watermarker: Watermarker) -> Self {
        Self {
            watermarker,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
            shared: Arc::new(Shared {
                state: Mutex::new(RunState {
                    processing: false,
                    generation: 0,
                    cancel: Arc::new(AtomicBool::new(false)),
                    run_id: None,
                    last_summary: None,
                }),
                finished: Condvar::new(),
            }),
        }
    }

    pub fn with_cancel_timeout(mut self, timeout: Duration) -> Self {
        self.cancel_timeout = timeout;
        self
    }

    pub fn cancel_timeout(&self) -> Duration {
        self.cancel_timeout
    }

    pub fn state(&self) -> BatchState {
        if self.is_processing() {
            BatchState::Processing
        } else {
            BatchState::Idle
        }
    }

    pub fn is_processing(&self) -> bool {
        self.shared.state.lock().processing
    }

    /// Whether the current run has been asked to stop.
    pub fn cancel_requested(&self) -> bool {
        let state = self.shared.state.lock();
        state.processing && state.cancel.load(Ordering::Acquire)
    }

    /// Id of the current or most recent run.
    pub fn run_id(&self) -> Option<Uuid> {
        self.shared.state.lock().run_id
    }

    /// Build one job per source path from `options` and start them.
    pub fn start_with<I, P>(
        &self,
        sources: I,
        spec: &WatermarkSpec,
        options: &BatchOptions,
        observer: Arc<dyn BatchObserver>,
    ) -> Result<Uuid, BatchError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.start(options.jobs(sources, spec), observer)
    }

    /// Start processing `jobs` in order on a new worker thread.
    ///
    /// Fails without changing any state if a run is active, `jobs` is
    /// empty, or an output directory cannot be created.
    pub fn start(
        &self,
        jobs: Vec<BatchJob>,
        observer: Arc<dyn BatchObserver>,
    ) -> Result<Uuid, BatchError> {
        let mut state = self.shared.state.lock();
        if state.processing {
            return Err(BatchError::AlreadyRunning);
        }
        if jobs.is_empty() {
            return Err(BatchError::NoJobs);
        }

        let mut created = HashSet::new();
        for job in &jobs {
            if created.insert(job.output_dir.clone()) {
                fs::create_dir_all(&job.output_dir).map_err(|source| BatchError::OutputDir {
                    path: job.output_dir.clone(),
                    source,
                })?;
            }
        }

        let run_id = Uuid::new_v4();
        let generation = state.generation + 1;
        let cancel = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            queue: jobs.into(),
            watermarker: self.watermarker.clone(),
            cancel: Arc::clone(&cancel),
            observer,
            run_id,
        };
        let guard = RunGuard {
            shared: Arc::clone(&self.shared),
            generation,
            summary: None,
        };

        thread::Builder::new()
            .name(format!("photomark-batch-{}", generation))
            .spawn(move || worker.run(guard))
            .map_err(BatchError::Spawn)?;

        state.processing = true;
        state.generation = generation;
        state.cancel = cancel;
        state.run_id = Some(run_id);
        Ok(run_id)
    }

    /// Block until the current run finishes and return its summary.
    ///
    /// Returns the most recent summary immediately when idle, or `None`
    /// if no run has completed yet or the run was force-reset by `cancel`.
    pub fn wait(&self) -> Option<BatchSummary> {
        let mut state = self.shared.state.lock();
        let generation = state.generation;
        while state.processing && state.generation == generation {
            self.shared.finished.wait(&mut state);
        }
        summary_for(&state, generation)
    }

    /// Ask the worker to stop after its current job and wait for it.
    ///
    /// If the worker has not stopped within the cancel timeout, the
    /// scheduler is reset to idle anyway and the worker finishes its job
    /// in the background.
    pub fn cancel(&self) -> CancelOutcome {
        let mut state = self.shared.state.lock();
        if !state.processing {
            return CancelOutcome::NotRunning;
        }

        let generation = state.generation;
        state.cancel.store(true, Ordering::Release);
        tracing::info!(run_id = ?state.run_id, "Batch cancellation requested");

        let deadline = Instant::now() + self.cancel_timeout;
        while state.processing && state.generation == generation {
            if self
                .shared
                .finished
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }

        if state.processing && state.generation == generation {
            state.processing = false;
            tracing::warn!(
                run_id = ?state.run_id,
                timeout_ms = self.cancel_timeout.as_millis() as u64,
                "Batch worker did not stop in time, forcing idle"
            );
            return CancelOutcome::TimedOut;
        }

        summary_for(&state, generation)
            .map(CancelOutcome::Stopped)
            .unwrap_or(CancelOutcome::TimedOut)
    }
}

fn summary_for(state: &RunState, generation: u64) -> Option<BatchSummary> {
    state
        .last_summary
        .filter(|(g, _)| *g == generation)
        .map(|(_, summary)| summary)
}

/// Resets the scheduler when the worker exits, including by panic.
struct RunGuard {
    shared: Arc<Shared>,
    generation: u64,
    summary: Option<BatchSummary>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        if state.generation == self.generation {
            state.processing = false;
            if let Some(summary) = self.summary.take() {
                state.last_summary = Some((self.generation, summary));
            }
        }
        drop(state);
        self.shared.finished.notify_all();
    }
}

struct Worker {
    queue: VecDeque<BatchJob>,
    watermarker: Watermarker,
    cancel: Arc<AtomicBool>,
    observer: Arc<dyn BatchObserver>,
    run_id: Uuid,
}

impl Worker {
    fn run(mut self, mut guard: RunGuard) {
        let total = self.queue.len();
        let span = tracing::info_span!("batch", run_id = %self.run_id, total);
        let _enter = span.enter();
        tracing::info!("Batch started");

        let started = Instant::now();
        let mut processed = 0usize;
        let mut failed = 0usize;

        while !self.cancel.load(Ordering::Acquire) {
            let Some(job) = self.queue.pop_front() else {
                break;
            };

            let output = job.output_path();
            let result = self.watermarker.apply_file(
                &job.source_path,
                &output,
                &job.spec,
                job.output_format,
                job.quality,
                &job.resize,
            );
            processed += 1;
            let percent = (processed * 100 / total) as u8;

            match result {
                Ok((width, height)) => {
                    tracing::debug!(
                        source = %job.source_path.display(),
                        output = %output.display(),
                        width,
                        height,
                        percent,
                        "Image processed"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        source = %job.source_path.display(),
                        error = %e,
                        "Image failed, continuing with next"
                    );
                    self.observer.on_error(&e.to_string(), &job.source_path);
                }
            }
            self.observer.on_progress(percent, &job.source_path);
        }

        let cancelled = self.cancel.load(Ordering::Acquire) && processed < total;
        let summary = BatchSummary {
            processed_count: processed,
            failed_count: failed,
            total_count: total,
            cancelled,
            success: !cancelled,
        };

        tracing::info!(
            processed,
            failed,
            cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );

        self.observer.on_complete(&summary);
        guard.summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FnObserver;
    use crate::font::{FontRegistry, FontRegistryConfig};
    use crate::imaging::Canvas;
    use image::Rgba;
    use std::path::Path;

    fn scheduler() -> BatchScheduler {
        BatchScheduler::new(Watermarker::new(Arc::new(FontRegistry::new(
            FontRegistryConfig::builtin_only(),
        ))))
    }

    fn write_source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        Canvas::filled(40, 30, Rgba([90, 90, 90, 255]))
            .as_rgba()
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_start_rejects_empty_batch() {
        let scheduler = scheduler();
        let err = scheduler
            .start(Vec::new(), Arc::new(FnObserver::new()))
            .unwrap_err();
        assert!(matches!(err, BatchError::NoJobs));
        assert_eq!(scheduler.state(), BatchState::Idle);
    }

    #[test]
    fn test_start_reports_output_dir_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let scheduler = scheduler();
        let jobs = BatchOptions::new(blocker.join("out"))
            .jobs([dir.path().join("a.png")], &WatermarkSpec::text("x"));
        let err = scheduler.start(jobs, Arc::new(FnObserver::new())).unwrap_err();

        assert!(matches!(err, BatchError::OutputDir { .. }));
        assert_eq!(scheduler.state(), BatchState::Idle);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        assert_eq!(scheduler().cancel(), CancelOutcome::NotRunning);
    }

    #[test]
    fn test_wait_returns_summary_and_goes_idle() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.png");
        let scheduler = scheduler();

        scheduler
            .start_with(
                [source],
                &WatermarkSpec::text("OK"),
                &BatchOptions::new(dir.path().join("out")),
                Arc::new(FnObserver::new()),
            )
            .unwrap();
        let summary = scheduler.wait().unwrap();

        assert_eq!(summary.processed_count, 1);
        assert_eq!(summary.failed_count, 0);
        assert!(summary.success && !summary.cancelled);
        assert_eq!(scheduler.state(), BatchState::Idle);
        assert!(dir.path().join("out").join("a.png").exists());
    }

    #[test]
    fn test_run_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.png");
        let scheduler = scheduler();
        let options = BatchOptions::new(dir.path().join("out"));

        let first = scheduler
            .start_with([&source], &WatermarkSpec::text("1"), &options, Arc::new(FnObserver::new()))
            .unwrap();
        scheduler.wait();
        let second = scheduler
            .start_with([&source], &WatermarkSpec::text("2"), &options, Arc::new(FnObserver::new()))
            .unwrap();
        scheduler.wait();

        assert_ne!(first, second);
        assert_eq!(scheduler.run_id(), Some(second));
    }

    #[test]
    fn test_stale_worker_does_not_reset_new_run() {
        let shared = scheduler().shared;
        {
            let mut state = shared.state.lock();
            state.processing = true;
            state.generation = 2;
        }

        drop(RunGuard {
            shared: Arc::clone(&shared),
            generation: 1,
            summary: Some(BatchSummary::default()),
        });

        let state = shared.state.lock();
        assert!(state.processing);
        assert!(state.last_summary.is_none());
    }
}
