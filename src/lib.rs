//! stats-job-server: concurrent HTTP job server for statistical queries
//!
//! Accepts statistical-analysis requests against a fixed in-memory dataset,
//! dispatches each to a bounded pool of worker threads, persists each job's
//! result to a per-job file on disk, and exposes endpoints to poll results,
//! enumerate jobs, and perform an orderly shutdown.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ids;
pub mod ingress;
pub mod job;
pub mod logging;
pub mod queue;
pub mod result_store;
pub mod shutdown;
pub mod worker_pool;

pub use config::AppConfig;
pub use error::AppError;
pub use ingress::AppState;
