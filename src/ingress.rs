//! The ingress contract: admits jobs, assigns ids, reads results, reports
//! pool state. This is the seam the HTTP layer is built against; every
//! handler in `api::handlers` is a thin translation from an axum extractor
//! to one of these methods.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::AppError;
use crate::ids::IdAllocator;
use crate::job::{Job, JobArgs, JobKind};
use crate::logging::Logger;
use crate::queue::JobQueue;
use crate::result_store::{ResultState, ResultStore};
use crate::shutdown::ShutdownController;
use crate::worker_pool::WorkerPool;

/// What a poll observed, ready for the HTTP layer to serialize.
pub enum PollOutcome {
    Running,
    Done(Value),
}

/// Response to a graceful-shutdown request.
pub struct ShutdownResponse {
    pub already_shutting_down: bool,
}

struct Inner {
    config: AppConfig,
    // Kept alive here too so `AppState` is the one owner the dataset's
    // lifetime is obviously tied to; the worker pool holds its own clone.
    #[allow(dead_code)]
    dataset: Arc<Dataset>,
    ids: IdAllocator,
    queue: Arc<JobQueue>,
    result_store: Arc<ResultStore>,
    shutdown: Arc<ShutdownController>,
    logger: Arc<Logger>,
    worker_pool: WorkerPool,
}

/// Shared application state, cheap to clone (one `Arc` underneath) and
/// passed to every axum handler via `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let dataset = Dataset::load(&config.dataset_path)
            .with_context(|| format!("loading dataset from {}", config.dataset_path))?;
        let dataset = Arc::new(dataset);

        let result_store = Arc::new(
            ResultStore::new(&config.results_dir)
                .with_context(|| format!("preparing results directory {}", config.results_dir))?,
        );
        let logger = Arc::new(
            Logger::new(&config.event_log_path)
                .with_context(|| format!("opening event log {}", config.event_log_path))?,
        );
        let queue = Arc::new(JobQueue::new());
        let shutdown = Arc::new(ShutdownController::new());
        let ids = IdAllocator::new();

        let worker_pool = WorkerPool::spawn(
            config.num_threads,
            Arc::clone(&queue),
            Arc::clone(&dataset),
            Arc::clone(&result_store),
            Arc::clone(&shutdown),
            Arc::clone(&logger),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                dataset,
                ids,
                queue,
                result_store,
                shutdown,
                logger,
                worker_pool,
            }),
        })
    }

    /// Admit a new job, or reject with 400 if shutdown is underway.
    pub fn submit(&self, kind: JobKind, args: JobArgs) -> Result<u64, AppError> {
        if self.inner.shutdown.is_shutting_down() {
            self.inner.logger.log_message(&format!(
                "ERROR cannot receive processing request for {kind:?} after graceful_shutdown"
            ));
            return Err(AppError::ShuttingDown);
        }

        let id = self.inner.ids.next();
        self.inner
            .result_store
            .register(id)
            .with_context(|| format!("registering job {id}"))?;
        self.inner.queue.put(Job { id, kind, args });
        Ok(id)
    }

    /// Validate and look up the current state of a job.
    pub fn poll(&self, id: i64) -> Result<PollOutcome, AppError> {
        if id <= 0 {
            self.inner
                .logger
                .log_message(&format!("ERROR Invalid job_id '{id}'"));
            return Err(AppError::InvalidJobId);
        }
        let id = id as u64;

        if id > self.inner.ids.last_issued() {
            self.inner
                .logger
                .log_message(&format!("ERROR Invalid job_id '{id}'"));
            return Err(AppError::InvalidJobId);
        }

        match self
            .inner
            .result_store
            .read(id)
            .with_context(|| format!("reading result for job {id}"))?
        {
            ResultState::Running => Ok(PollOutcome::Running),
            ResultState::Done(data) => Ok(PollOutcome::Done(data)),
            ResultState::Missing => Err(AppError::ResultFileMissing(id)),
        }
    }

    /// Best-effort count of jobs still sitting in the queue.
    pub fn num_pending(&self) -> usize {
        self.inner.queue.size()
    }

    /// `{id: "running"|"done"}` for every id that still has a file on disk.
    pub fn jobs_status(&self) -> Vec<(u64, &'static str)> {
        let last = self.inner.ids.last_issued();
        let mut out = Vec::new();
        for id in 1..=last {
            match self.inner.result_store.read(id) {
                Ok(ResultState::Running) => out.push((id, "running")),
                Ok(ResultState::Done(_)) => out.push((id, "done")),
                Ok(ResultState::Missing) => {}
                Err(_) => {}
            }
        }
        out
    }

    /// Run the quiesce protocol exactly once; idempotent on repeat calls.
    pub fn request_shutdown(&self) -> ShutdownResponse {
        if !self.inner.shutdown.begin() {
            return ShutdownResponse {
                already_shutting_down: true,
            };
        }

        for _ in 0..self.inner.config.num_threads {
            self.inner.queue.put_sentinel();
        }
        self.inner.worker_pool.join_all(&self.inner.logger);
        self.inner.logger.log_message("graceful shutdown complete");

        ShutdownResponse {
            already_shutting_down: false,
        }
    }
}
