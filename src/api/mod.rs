//! HTTP surface: the `/api/*` statistics and job-control endpoints plus
//! `/healthz`, all built against [`crate::ingress::AppState`].

pub mod handlers;
mod routes;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::ingress::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
}
