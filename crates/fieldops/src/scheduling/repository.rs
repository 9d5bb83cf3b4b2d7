use std::collections::HashMap;

use super::domain::{AvailabilityWindow, Job, JobId, Technician, TechnicianId};
use super::interval::{CalendarDay, TimeRange};

/// Read-only access to the dispatch datastore.
///
/// Range hints are lower bounds on what the ranker needs: adapters may return
/// more than asked for, and the ranker re-checks the timing and status of
/// every record it receives.
/// The bulk accessors default to looping over the per-technician ones; a
/// datastore that supports `IN (...)` lookups should override them.
pub trait SchedulingRepository: Send + Sync {
    fn get_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;

    /// Technicians whose `is_available` flag is set.
    fn list_active_technicians(&self) -> Result<Vec<Technician>, RepositoryError>;

    /// Windows for `technician` that may intersect `range`.
    fn list_availability_windows(
        &self,
        technician: &TechnicianId,
        range: &TimeRange,
    ) -> Result<Vec<AvailabilityWindow>, RepositoryError>;

    /// Active jobs for `technician` whose start precedes `range.end`.
    fn list_active_jobs_for_technician(
        &self,
        technician: &TechnicianId,
        range: &TimeRange,
    ) -> Result<Vec<Job>, RepositoryError>;

    /// Active jobs for `technician` starting within `day`.
    fn count_active_jobs_for_technician_on_day(
        &self,
        technician: &TechnicianId,
        day: &CalendarDay,
    ) -> Result<u32, RepositoryError>;

    fn availability_windows_for(
        &self,
        technicians: &[TechnicianId],
        range: &TimeRange,
    ) -> Result<HashMap<TechnicianId, Vec<AvailabilityWindow>>, RepositoryError> {
        let mut windows = HashMap::with_capacity(technicians.len());
        for technician in technicians {
            let found = self.list_availability_windows(technician, range)?;
            windows.insert(technician.clone(), found);
        }
        Ok(windows)
    }

    fn active_jobs_for(
        &self,
        technicians: &[TechnicianId],
        range: &TimeRange,
    ) -> Result<HashMap<TechnicianId, Vec<Job>>, RepositoryError> {
        let mut jobs = HashMap::with_capacity(technicians.len());
        for technician in technicians {
            let found = self.list_active_jobs_for_technician(technician, range)?;
            jobs.insert(technician.clone(), found);
        }
        Ok(jobs)
    }

    fn same_day_loads(
        &self,
        technicians: &[TechnicianId],
        day: &CalendarDay,
    ) -> Result<HashMap<TechnicianId, u32>, RepositoryError> {
        let mut loads = HashMap::with_capacity(technicians.len());
        for technician in technicians {
            let count = self.count_active_jobs_for_technician_on_day(technician, day)?;
            loads.insert(technician.clone(), count);
        }
        Ok(loads)
    }
}

/// Persists an assignment chosen by the ranker.
///
/// Ranking reads a snapshot, so two concurrent auto-assign calls can pick the
/// same technician for overlapping jobs. Implementations must make the write
/// conditional (transaction, compare-and-set, or a per-technician lock) and
/// answer [`RepositoryError::Conflict`] when the technician picked up an
/// overlapping active job after ranking.
pub trait AssignmentWriter: Send + Sync {
    fn assign_technician(
        &self,
        job: &JobId,
        technician: &TechnicianId,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for datastore failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting write")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
