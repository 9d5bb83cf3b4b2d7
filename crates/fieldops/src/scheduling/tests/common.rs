use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::scheduling::domain::{
    AvailabilityWindow, Job, JobId, JobStatus, Technician, TechnicianId,
};
use crate::scheduling::geo::GeoPoint;
use crate::scheduling::interval::{overlaps, CalendarDay, TimeRange};
use crate::scheduling::repository::{AssignmentWriter, RepositoryError, SchedulingRepository};
use crate::scheduling::{scheduling_router, AssignmentService, SchedulingConfig};

pub(super) const CITY_CENTRE: GeoPoint = GeoPoint::new(3.1390, 101.6869);
pub(super) const JOB_SITE: GeoPoint = GeoPoint::new(3.1073, 101.6085);
/// Roughly 3 km north of the job site.
pub(super) const NORTH_OF_SITE: GeoPoint = GeoPoint::new(3.1343, 101.6085);
/// About 124 km south-east of the job site.
pub(super) const MELAKA: GeoPoint = GeoPoint::new(2.1896, 102.2501);

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    on(14, hour, minute)
}

pub(super) fn on(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn tech_id(raw: &str) -> TechnicianId {
    TechnicianId(raw.to_string())
}

pub(super) fn job_id(raw: &str) -> JobId {
    JobId(raw.to_string())
}

pub(super) fn technician(id: &str, home: GeoPoint, radius_km: f64) -> Technician {
    Technician {
        id: tech_id(id),
        name: format!("Technician {id}"),
        home: Some(home),
        service_radius_km: Some(radius_km),
        is_available: true,
    }
}

pub(super) fn working_hours(id: &str) -> AvailabilityWindow {
    window(id, at(8, 0), at(20, 0))
}

pub(super) fn window(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> AvailabilityWindow {
    AvailabilityWindow {
        technician_id: tech_id(id),
        start,
        end,
    }
}

pub(super) fn job(id: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Job {
    Job {
        id: job_id(id),
        location: Some(JOB_SITE),
        start,
        end,
        technician_id: None,
        status: JobStatus::Pending,
    }
}

pub(super) fn commitment(
    id: &str,
    technician: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Job {
    Job {
        technician_id: Some(tech_id(technician)),
        status: JobStatus::InProgress,
        ..job(id, start, end)
    }
}

/// Bulk lookups issued by the ranker, in call order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Lookup {
    Windows(Vec<TechnicianId>),
    Jobs(Vec<TechnicianId>),
    Loads(Vec<TechnicianId>),
}

#[derive(Default)]
struct MemoryState {
    jobs: HashMap<JobId, Job>,
    technicians: Vec<Technician>,
    windows: Vec<AvailabilityWindow>,
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    state: Mutex<MemoryState>,
    lookups: Mutex<Vec<Lookup>>,
    include_unavailable: bool,
    offline_windows: bool,
}

impl MemoryRepository {
    pub(super) fn with_technician(mut self, technician: Technician) -> Self {
        self.state_mut().technicians.push(technician);
        self
    }

    pub(super) fn with_window(mut self, window: AvailabilityWindow) -> Self {
        self.state_mut().windows.push(window);
        self
    }

    pub(super) fn with_job(mut self, job: Job) -> Self {
        self.state_mut().jobs.insert(job.id.clone(), job);
        self
    }

    /// Returns technicians regardless of their availability flag.
    pub(super) fn leaking_unavailable(mut self) -> Self {
        self.include_unavailable = true;
        self
    }

    pub(super) fn with_offline_windows(mut self) -> Self {
        self.offline_windows = true;
        self
    }

    pub(super) fn job(&self, id: &JobId) -> Option<Job> {
        self.state().jobs.get(id).cloned()
    }

    pub(super) fn lookups(&self) -> Vec<Lookup> {
        self.lookups.lock().expect("lookup mutex poisoned").clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("repository mutex poisoned")
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().expect("repository mutex poisoned")
    }

    fn record(&self, lookup: Lookup) {
        self.lookups
            .lock()
            .expect("lookup mutex poisoned")
            .push(lookup);
    }
}

impl SchedulingRepository for MemoryRepository {
    fn get_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.job(id))
    }

    fn list_active_technicians(&self) -> Result<Vec<Technician>, RepositoryError> {
        Ok(self
            .state()
            .technicians
            .iter()
            .filter(|technician| self.include_unavailable || technician.is_available)
            .cloned()
            .collect())
    }

    fn list_availability_windows(
        &self,
        technician: &TechnicianId,
        range: &TimeRange,
    ) -> Result<Vec<AvailabilityWindow>, RepositoryError> {
        if self.offline_windows {
            return Err(RepositoryError::Unavailable(
                "availability service offline".to_string(),
            ));
        }

        Ok(self
            .state()
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
        Ok(self
            .state()
            .jobs
            .values()
            .filter(|job| job.technician_id.as_ref() == Some(technician))
            .filter(|job| job.is_active() && job.start < range.end)
            .cloned()
            .collect())
    }

    fn count_active_jobs_for_technician_on_day(
        &self,
        technician: &TechnicianId,
        day: &CalendarDay,
    ) -> Result<u32, RepositoryError> {
        let count = self
            .state()
            .jobs
            .values()
            .filter(|job| job.technician_id.as_ref() == Some(technician))
            .filter(|job| job.is_active() && day.contains(job.start))
            .count();
        Ok(count as u32)
    }

    fn availability_windows_for(
        &self,
        technicians: &[TechnicianId],
        range: &TimeRange,
    ) -> Result<HashMap<TechnicianId, Vec<AvailabilityWindow>>, RepositoryError> {
        self.record(Lookup::Windows(technicians.to_vec()));
        let mut windows = HashMap::new();
        for technician in technicians {
            windows.insert(
                technician.clone(),
                self.list_availability_windows(technician, range)?,
            );
        }
        Ok(windows)
    }

    fn active_jobs_for(
        &self,
        technicians: &[TechnicianId],
        range: &TimeRange,
    ) -> Result<HashMap<TechnicianId, Vec<Job>>, RepositoryError> {
        self.record(Lookup::Jobs(technicians.to_vec()));
        let mut jobs = HashMap::new();
        for technician in technicians {
            jobs.insert(
                technician.clone(),
                self.list_active_jobs_for_technician(technician, range)?,
            );
        }
        Ok(jobs)
    }

    fn same_day_loads(
        &self,
        technicians: &[TechnicianId],
        day: &CalendarDay,
    ) -> Result<HashMap<TechnicianId, u32>, RepositoryError> {
        self.record(Lookup::Loads(technicians.to_vec()));
        let mut loads = HashMap::new();
        for technician in technicians {
            loads.insert(
                technician.clone(),
                self.count_active_jobs_for_technician_on_day(technician, day)?,
            );
        }
        Ok(loads)
    }
}

impl AssignmentWriter for MemoryRepository {
    fn assign_technician(
        &self,
        job: &JobId,
        technician: &TechnicianId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let target = state.jobs.get(job).cloned().ok_or(RepositoryError::NotFound)?;

        let clash = state.jobs.values().any(|existing| {
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

        if let Some(stored) = state.jobs.get_mut(job) {
            stored.technician_id = Some(technician.clone());
        }
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl SchedulingRepository for UnavailableRepository {
    fn get_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_active_technicians(&self) -> Result<Vec<Technician>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_availability_windows(
        &self,
        _technician: &TechnicianId,
        _range: &TimeRange,
    ) -> Result<Vec<AvailabilityWindow>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_active_jobs_for_technician(
        &self,
        _technician: &TechnicianId,
        _range: &TimeRange,
    ) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_active_jobs_for_technician_on_day(
        &self,
        _technician: &TechnicianId,
        _day: &CalendarDay,
    ) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl AssignmentWriter for UnavailableRepository {
    fn assign_technician(
        &self,
        _job: &JobId,
        _technician: &TechnicianId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Writer that always loses the race to a concurrent assignment.
pub(super) struct RacingWriter;

impl AssignmentWriter for RacingWriter {
    fn assign_technician(
        &self,
        _job: &JobId,
        _technician: &TechnicianId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }
}

/// One technician in the city centre who is free all day, plus `job-1` at the
/// job site from 14:00 to 15:00.
pub(super) fn scenario_a_repository() -> MemoryRepository {
    MemoryRepository::default()
        .with_technician(technician("tech-aina", CITY_CENTRE, 25.0))
        .with_window(working_hours("tech-aina"))
        .with_job(job("job-1", at(14, 0), Some(at(15, 0))))
}

pub(super) fn service_for(
    repository: MemoryRepository,
) -> (AssignmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(repository);
    let service = AssignmentService::new(repository.clone(), SchedulingConfig::default());
    (service, repository)
}

pub(super) fn router_for(repository: MemoryRepository) -> (axum::Router, Arc<MemoryRepository>) {
    let (service, repository) = service_for(repository);
    let router = scheduling_router(Arc::new(service), repository.clone());
    (router, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
