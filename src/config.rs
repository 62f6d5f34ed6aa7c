//! Startup configuration.
//!
//! Resolved once in `main` and threaded explicitly through an `AppState`
//! rather than kept as a process-wide singleton.

use clap::Parser;

/// CLI flags, each falling back to the environment variable of the same
/// name the original implementation was driven by.
#[derive(Parser, Debug)]
#[command(name = "stats-job-server")]
#[command(about = "Concurrent HTTP job server for statistical queries")]
pub struct CliArgs {
    /// Worker thread count. Falls back to hardware concurrency if unset.
    #[arg(long, env = "TP_NUM_OF_THREADS")]
    pub threads: Option<usize>,

    /// HTTP listen address.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Path to the source CSV dataset.
    #[arg(
        long,
        env = "DATASET_PATH",
        default_value = "./nutrition_activity_obesity_usa_subset.csv"
    )]
    pub dataset_path: String,

    /// Directory per-job result files are written under.
    #[arg(long, env = "RESULTS_DIR", default_value = "results")]
    pub results_dir: String,

    /// Path to the dedicated, rotated job-event log.
    #[arg(long, env = "EVENT_LOG_PATH", default_value = "webserver.log")]
    pub event_log_path: String,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub num_threads: usize,
    pub bind_addr: String,
    pub dataset_path: String,
    pub results_dir: String,
    pub event_log_path: String,
}

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Self {
        let num_threads = args
            .threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));

        Self {
            num_threads,
            bind_addr: args.bind_addr,
            dataset_path: args.dataset_path,
            results_dir: args.results_dir,
            event_log_path: args.event_log_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_falls_back_to_hardware_concurrency() {
        let args = CliArgs {
            threads: Some(0),
            bind_addr: "127.0.0.1:0".into(),
            dataset_path: "data.csv".into(),
            results_dir: "results".into(),
            event_log_path: "webserver.log".into(),
        };
        let config = AppConfig::from_args(args);
        assert!(config.num_threads >= 1);
    }

    #[test]
    fn positive_thread_count_is_honored() {
        let args = CliArgs {
            threads: Some(4),
            bind_addr: "127.0.0.1:0".into(),
            dataset_path: "data.csv".into(),
            results_dir: "results".into(),
            event_log_path: "webserver.log".into(),
        };
        let config = AppConfig::from_args(args);
        assert_eq!(config.num_threads, 4);
    }
}
