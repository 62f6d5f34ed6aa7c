//! Bounded pool of long-lived OS threads consuming the job queue.
//!
//! Workers are created once at startup and never respawn. Each iteration
//! checks the shutdown flag, blocks on the queue for up to one second, and
//! on a job runs the compute dispatcher behind `catch_unwind` so a panic in
//! a computation can't take the worker thread down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::json;
use tracing::{error, info};

use crate::dataset::{compute, Dataset};
use crate::logging::Logger;
use crate::queue::{JobQueue, QueueItem, TakeOutcome};
use crate::result_store::ResultStore;
use crate::shutdown::ShutdownController;

const TAKE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct WorkerPool {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `count` worker threads sharing the given collaborators.
    pub fn spawn(
        count: usize,
        queue: Arc<JobQueue>,
        dataset: Arc<Dataset>,
        result_store: Arc<ResultStore>,
        shutdown: Arc<ShutdownController>,
        logger: Arc<Logger>,
    ) -> Self {
        let mut handles = Vec::with_capacity(count);
        for worker_id in 0..count {
            let queue = Arc::clone(&queue);
            let dataset = Arc::clone(&dataset);
            let result_store = Arc::clone(&result_store);
            let shutdown = Arc::clone(&shutdown);
            let logger = Arc::clone(&logger);

            handles.push(
                thread::Builder::new()
                    .name(format!("stats-worker-{worker_id}"))
                    .spawn(move || run_worker(worker_id, &queue, &dataset, &result_store, &shutdown, &logger))
                    .expect("failed to spawn worker thread"),
            );
        }
        Self {
            handles: Mutex::new(handles),
        }
    }

    /// Join every worker thread, in id order, logging each join. Idempotent:
    /// a second call finds no handles left and returns immediately.
    #[allow(clippy::unwrap_used)]
    pub fn join_all(&self, logger: &Logger) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if let Err(e) = handle.join() {
                error!(worker_id, ?e, "worker thread panicked during shutdown join");
            }
            logger.log_message(&format!("joined worker {name}"));
        }
    }
}

fn run_worker(
    worker_id: usize,
    queue: &JobQueue,
    dataset: &Dataset,
    result_store: &ResultStore,
    shutdown: &ShutdownController,
    logger: &Logger,
) {
    loop {
        if shutdown.is_shutting_down() {
            return;
        }

        match queue.take(TAKE_TIMEOUT) {
            TakeOutcome::TimedOut => continue,
            TakeOutcome::Item(QueueItem::Sentinel) => return,
            TakeOutcome::Item(QueueItem::Job(job)) => {
                let payload = match catch_unwind(AssertUnwindSafe(|| {
                    compute::dispatch(dataset, job.kind, &job.args)
                })) {
                    Ok(value) => value,
                    Err(_) => {
                        error!(worker_id, job_id = job.id, "computation panicked");
                        json!({ "error": "computation failed" })
                    }
                };

                if let Err(e) = result_store.finalize(job.id, &payload) {
                    error!(worker_id, job_id = job.id, error = %e, "failed to write result file");
                    logger.log_message(&format!(
                        "ERROR failed to finalize job {} : {e}",
                        job.id
                    ));
                    continue;
                }

                info!(worker_id, job_id = job.id, "computed");
                logger.log_message(&format!("computed job {}", job.id));
            }
        }
    }
}
