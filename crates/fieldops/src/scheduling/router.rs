use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::domain::{JobId, TechnicianId};
use super::repository::{AssignmentWriter, RepositoryError, SchedulingRepository};
use super::service::{AssignmentDecision, AssignmentService, SchedulingError};

/// Shared handler state: the read-side service plus the assignment writer.
pub struct SchedulingState<R, W> {
    service: Arc<AssignmentService<R>>,
    writer: Arc<W>,
}

impl<R, W> SchedulingState<R, W> {
    pub fn new(service: Arc<AssignmentService<R>>, writer: Arc<W>) -> Self {
        Self { service, writer }
    }
}

impl<R, W> Clone for SchedulingState<R, W> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            writer: self.writer.clone(),
        }
    }
}

/// Payload returned once an auto-assignment has been written.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    pub job_id: JobId,
    pub technician_id: TechnicianId,
    pub distance_km: f64,
    pub same_day_load: u32,
}

/// Router builder exposing eligibility and auto-assign endpoints.
pub fn scheduling_router<R, W>(service: Arc<AssignmentService<R>>, writer: Arc<W>) -> Router
where
    R: SchedulingRepository + 'static,
    W: AssignmentWriter + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs/:job_id/eligible-technicians",
            get(eligible_handler::<R, W>),
        )
        .route(
            "/api/v1/jobs/:job_id/auto-assign",
            post(auto_assign_handler::<R, W>),
        )
        .with_state(SchedulingState::new(service, writer))
}

pub(crate) async fn eligible_handler<R, W>(
    State(state): State<SchedulingState<R, W>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    W: AssignmentWriter + 'static,
{
    let job_id = JobId(job_id);
    match state.service.assess(&job_id) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => scheduling_error_response(&job_id, err),
    }
}

pub(crate) async fn auto_assign_handler<R, W>(
    State(state): State<SchedulingState<R, W>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    W: AssignmentWriter + 'static,
{
    let job_id = JobId(job_id);
    let candidate = match state.service.auto_assign_technician(&job_id) {
        Ok(AssignmentDecision::Assigned(candidate)) => candidate,
        Ok(AssignmentDecision::Unassigned { reason }) => {
            let payload = json!({
                "job_id": job_id,
                "error": "no suitable technician found",
                "reason": reason,
                "detail": reason.summary(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        Err(err) => return scheduling_error_response(&job_id, err),
    };

    match state
        .writer
        .assign_technician(&job_id, &candidate.technician_id)
    {
        Ok(()) => {
            let view = AssignmentView {
                job_id,
                technician_id: candidate.technician_id,
                distance_km: candidate.distance_km,
                same_day_load: candidate.same_day_load,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(RepositoryError::Conflict) => {
            let payload = json!({
                "job_id": job_id,
                "technician_id": candidate.technician_id,
                "error": "technician was booked by a concurrent assignment",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(err) => scheduling_error_response(&job_id, SchedulingError::Repository(err)),
    }
}

fn scheduling_error_response(job_id: &JobId, err: SchedulingError) -> Response {
    match err {
        SchedulingError::JobNotFound(_) | SchedulingError::Repository(RepositoryError::NotFound) => {
            let payload = json!({
                "job_id": job_id,
                "error": "job not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            warn!(job_id = %job_id, error = %other, "scheduling request failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
