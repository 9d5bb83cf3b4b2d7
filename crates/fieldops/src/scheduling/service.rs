use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{CandidateTechnician, Job, JobId, TechnicianId};
use super::eligibility::{EligibilityRanker, EligibilityReport, SchedulingConfig};
use super::repository::{RepositoryError, SchedulingRepository};

/// Outcome of an auto-assign request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentDecision {
    Assigned(CandidateTechnician),
    Unassigned { reason: UnassignedReason },
}

impl AssignmentDecision {
    pub fn technician_id(&self) -> Option<&TechnicianId> {
        match self {
            AssignmentDecision::Assigned(candidate) => Some(&candidate.technician_id),
            AssignmentDecision::Unassigned { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            AssignmentDecision::Assigned(candidate) => format!(
                "assigned {} ({:.1} km away, {} job(s) that day)",
                candidate.technician_id, candidate.distance_km, candidate.same_day_load
            ),
            AssignmentDecision::Unassigned { reason } => {
                format!("no suitable technician found: {}", reason.summary())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    MissingJobLocation,
    NoEligibleTechnician,
}

impl UnassignedReason {
    pub const fn summary(self) -> &'static str {
        match self {
            UnassignedReason::MissingJobLocation => "job has no geocoded location",
            UnassignedReason::NoEligibleTechnician => "no technician passed every filter",
        }
    }
}

/// Entry points consumed by the web layer.
///
/// The service only reads. Writing the chosen technician back, and guarding
/// that write against concurrent assignments, belongs to the caller (see
/// [`super::repository::AssignmentWriter`]).
pub struct AssignmentService<R> {
    repository: Arc<R>,
    ranker: EligibilityRanker,
}

impl<R> AssignmentService<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: SchedulingConfig) -> Self {
        Self {
            repository,
            ranker: EligibilityRanker::new(config),
        }
    }

    /// Ranked candidates and exclusion trail for a stored job.
    pub fn assess(&self, job_id: &JobId) -> Result<EligibilityReport, SchedulingError> {
        let job = self.load_job(job_id)?;
        self.assess_job(&job)
    }

    /// Same as [`Self::assess`] for a job the caller already holds.
    pub fn assess_job(&self, job: &Job) -> Result<EligibilityReport, SchedulingError> {
        let report = self.ranker.assess(job, self.repository.as_ref())?;
        Ok(report)
    }

    pub fn find_eligible_technicians(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<CandidateTechnician>, SchedulingError> {
        Ok(self.assess(job_id)?.into_candidates())
    }

    pub fn auto_assign_technician(
        &self,
        job_id: &JobId,
    ) -> Result<AssignmentDecision, SchedulingError> {
        let report = self.assess(job_id)?;
        let decision = decide(report);
        info!(job_id = %job_id, decision = %decision.summary(), "auto-assign evaluated");
        Ok(decision)
    }

    fn load_job(&self, job_id: &JobId) -> Result<Job, SchedulingError> {
        self.repository
            .get_job(job_id)?
            .ok_or_else(|| SchedulingError::JobNotFound(job_id.clone()))
    }
}

/// Picks the top-ranked candidate from a report.
pub fn decide(report: EligibilityReport) -> AssignmentDecision {
    if !report.job_located {
        return AssignmentDecision::Unassigned {
            reason: UnassignedReason::MissingJobLocation,
        };
    }

    match report.candidates.into_iter().next() {
        Some(candidate) => AssignmentDecision::Assigned(candidate),
        None => AssignmentDecision::Unassigned {
            reason: UnassignedReason::NoEligibleTechnician,
        },
    }
}

/// Error raised by the assignment service.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
