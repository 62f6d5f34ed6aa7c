//! HTTP handlers: thin translations from axum extractors to [`AppState`]
//! methods. No handler owns any logic beyond parsing its request and
//! shaping its response.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::ingress::{AppState, PollOutcome};
use crate::job::{JobArgs, JobKind};

#[derive(Debug, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(serde::Serialize)]
struct SubmitResponse {
    job_id: u64,
}

fn submit(app: &AppState, kind: JobKind, req: JobRequest) -> Result<Json<SubmitResponse>, AppError> {
    let args = JobArgs {
        question: req.question,
        state: req.state,
    };
    let job_id = app.submit(kind, args)?;
    Ok(Json(SubmitResponse { job_id }))
}

pub async fn states_mean(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::StatesMean, req)
}

pub async fn state_mean(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::StateMean, req)
}

pub async fn best5(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::Best5, req)
}

pub async fn worst5(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::Worst5, req)
}

pub async fn global_mean(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::GlobalMean, req)
}

pub async fn diff_from_mean(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::DiffFromMean, req)
}

pub async fn state_diff_from_mean(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::StateDiffFromMean, req)
}

pub async fn mean_by_category(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::MeanByCategory, req)
}

pub async fn state_mean_by_category(
    State(app): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    submit(&app, JobKind::StateMeanByCategory, req)
}

pub async fn get_results(
    State(app): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let job_id: i64 = job_id.parse().map_err(|_| AppError::InvalidJobId)?;
    match app.poll(job_id)? {
        PollOutcome::Running => Ok(Json(json!({ "status": "running" }))),
        PollOutcome::Done(data) => Ok(Json(json!({ "status": "done", "data": data }))),
    }
}

pub async fn num_jobs(State(app): State<AppState>) -> Json<Value> {
    Json(json!({ "num_pending_job": app.num_pending() }))
}

pub async fn jobs(State(app): State<AppState>) -> Json<Value> {
    let data: Vec<Value> = app
        .jobs_status()
        .into_iter()
        .map(|(id, status)| {
            let mut entry = Map::new();
            entry.insert(format!("job_id_{id}"), Value::String(status.to_string()));
            Value::Object(entry)
        })
        .collect();
    Json(json!({ "status": "done", "data": data }))
}

pub async fn graceful_shutdown(State(app): State<AppState>) -> Json<Value> {
    let result = app.request_shutdown();
    if result.already_shutting_down {
        Json(json!({ "status": "done", "reason": "already shut down" }))
    } else {
        Json(json!({ "status": "done" }))
    }
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("data.csv");
        std::fs::write(
            &dataset_path,
            "id,YearStart,YearEnd,LocationAbbr,LocationDesc\n",
        )
        .unwrap();

        let config = AppConfig {
            num_threads: 1,
            bind_addr: "127.0.0.1:0".into(),
            dataset_path: dataset_path.to_string_lossy().into_owned(),
            results_dir: dir.path().join("results").to_string_lossy().into_owned(),
            event_log_path: dir.path().join("webserver.log").to_string_lossy().into_owned(),
        };
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let response = healthz().await;
        assert_eq!(response.0["status"], "ok");
    }

    #[tokio::test]
    async fn num_jobs_starts_at_zero() {
        let app = test_state();
        let router = crate::api::build_router(app);
        let response = router
            .oneshot(Request::builder().uri("/api/num_jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
