//! API route definitions
//!
//! Wires each statistics endpoint to its handler under `/api`, plus the
//! job-control (`num_jobs`, `jobs`, `graceful_shutdown`) and `/healthz`
//! endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use crate::ingress::AppState;

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/states_mean", post(handlers::states_mean))
        .route("/state_mean", post(handlers::state_mean))
        .route("/best5", post(handlers::best5))
        .route("/worst5", post(handlers::worst5))
        .route("/global_mean", post(handlers::global_mean))
        .route("/diff_from_mean", post(handlers::diff_from_mean))
        .route("/state_diff_from_mean", post(handlers::state_diff_from_mean))
        .route("/mean_by_category", post(handlers::mean_by_category))
        .route("/state_mean_by_category", post(handlers::state_mean_by_category))
        .route("/get_results/:job_id", get(handlers::get_results))
        .route("/num_jobs", get(handlers::num_jobs))
        .route("/jobs", get(handlers::jobs))
        .route("/graceful_shutdown", get(handlers::graceful_shutdown))
        .with_state(state)
}
