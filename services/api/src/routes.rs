use crate::infra::{AppState, InMemoryDispatchStore};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use fieldops::error::AppError;
use fieldops::scheduling::{
    decide, scheduling_router, AssignmentDecision, AssignmentService, EligibilityReport, Job,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

type DispatchService = AssignmentService<InMemoryDispatchStore>;

#[derive(Debug, Serialize)]
pub(crate) struct RankResponse {
    pub(crate) report: EligibilityReport,
    pub(crate) decision: AssignmentDecision,
}

pub(crate) fn with_scheduling_routes(
    service: Arc<DispatchService>,
    store: Arc<InMemoryDispatchStore>,
) -> axum::Router {
    scheduling_router(service.clone(), store)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/dispatch/rank", axum::routing::post(rank_endpoint))
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Ranks a job that is not on file, against the live roster and bookings.
pub(crate) async fn rank_endpoint(
    Extension(service): Extension<Arc<DispatchService>>,
    Json(job): Json<Job>,
) -> Result<Json<RankResponse>, AppError> {
    let report = service.assess_job(&job)?;
    let decision = decide(report.clone());
    Ok(Json(RankResponse { report, decision }))
}
