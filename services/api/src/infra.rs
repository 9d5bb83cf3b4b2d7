use chrono::{DateTime, NaiveDate, Utc};
use fieldops::scheduling::{
    overlaps, AssignmentWriter, AvailabilityWindow, CalendarDay, Job, JobId, RepositoryError,
    SchedulingRepository, Technician, TechnicianId, TimeRange,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct DispatchState {
    technicians: Vec<Technician>,
    windows: Vec<AvailabilityWindow>,
    jobs: HashMap<JobId, Job>,
}

/// Process-local stand-in for the dispatch datastore.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDispatchStore {
    state: Arc<Mutex<DispatchState>>,
}

impl InMemoryDispatchStore {
    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn seed(
        &self,
        technicians: Vec<Technician>,
        windows: Vec<AvailabilityWindow>,
        jobs: Vec<Job>,
    ) {
        let mut guard = self.lock();
        guard.technicians.extend(technicians);
        guard.windows.extend(windows);
        guard
            .jobs
            .extend(jobs.into_iter().map(|job| (job.id.clone(), job)));
    }

    pub(crate) fn technician_ids(&self) -> Vec<TechnicianId> {
        let guard = self.lock();
        guard
            .technicians
            .iter()
            .map(|technician| technician.id.clone())
            .collect()
    }

    pub(crate) fn job(&self, id: &JobId) -> Option<Job> {
        self.lock().jobs.get(id).cloned()
    }

    pub(crate) fn job_ids(&self) -> Vec<JobId> {
        let guard = self.lock();
        let mut ids: Vec<JobId> = guard.jobs.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl SchedulingRepository for InMemoryDispatchStore {
    fn get_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.lock();
        Ok(guard.jobs.get(id).cloned())
    }

    fn list_active_technicians(&self) -> Result<Vec<Technician>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
            .technicians
            .iter()
            .filter(|technician| technician.is_available)
            .cloned()
            .collect())
    }

    fn list_availability_windows(
        &self,
        technician: &TechnicianId,
        range: &TimeRange,
    ) -> Result<Vec<AvailabilityWindow>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
            .windows
            .iter()
            .filter(|window| &window.technician_id == technician && window.range().overlaps(range))
            .cloned()
            .collect())
    }

    fn list_active_jobs_for_technician(
        &self,
        technician: &TechnicianId,
        range: &TimeRange,
    ) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
            .jobs
            .values()
            .filter(|job| job.technician_id.as_ref() == Some(technician))
            .filter(|job| job.is_active() && job.interval().overlaps(range))
            .cloned()
            .collect())
    }

    fn count_active_jobs_for_technician_on_day(
        &self,
        technician: &TechnicianId,
        day: &CalendarDay,
    ) -> Result<u32, RepositoryError> {
        let guard = self.lock();
        let count = guard
            .jobs
            .values()
            .filter(|job| job.technician_id.as_ref() == Some(technician))
            .filter(|job| job.is_active() && day.contains(job.start))
            .count();
        Ok(count as u32)
    }
}

impl AssignmentWriter for InMemoryDispatchStore {
    /// Re-checks for a clashing booking under the same lock that writes, so
    /// two concurrent auto-assigns cannot both land on one technician.
    fn assign_technician(
        &self,
        job: &JobId,
        technician: &TechnicianId,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let target = guard.jobs.get(job).cloned().ok_or(RepositoryError::NotFound)?;

        let clash = guard.jobs.values().any(|existing| {
            existing.id != target.id
                && existing.is_active()
                && existing.technician_id.as_ref() == Some(technician)
                && overlaps(
                    existing.start,
                    existing.end,
                    target.start,
                    target.effective_end(),
                )
        });
        if clash {
            return Err(RepositoryError::Conflict);
        }

        if let Some(stored) = guard.jobs.get_mut(job) {
            stored.technician_id = Some(technician.clone());
        }
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
