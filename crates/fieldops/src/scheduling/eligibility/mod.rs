mod config;
mod policy;
mod stages;

pub use config::SchedulingConfig;
pub use policy::WindowPolicy;
pub use stages::{Exclusion, ExclusionReason};

use super::domain::{CandidateTechnician, Job, JobId, TechnicianId};
use super::interval::CalendarDay;
use super::repository::{RepositoryError, SchedulingRepository};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Ranked candidates for one job together with the trail of exclusions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityReport {
    pub job_id: JobId,
    /// False when the job had no coordinates and could not be ranked at all.
    pub job_located: bool,
    pub candidates: Vec<CandidateTechnician>,
    pub exclusions: Vec<Exclusion>,
}

impl EligibilityReport {
    fn unlocated(job_id: JobId) -> Self {
        Self {
            job_id,
            job_located: false,
            candidates: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn top_candidate(&self) -> Option<&CandidateTechnician> {
        self.candidates.first()
    }

    pub fn into_candidates(self) -> Vec<CandidateTechnician> {
        self.candidates
    }
}

/// Filters the technician pool for a job and orders the survivors.
///
/// Stages run in a fixed order and a technician leaves the pool at the first
/// stage it fails. Each data-dependent stage issues a single bulk read for the
/// technicians still in play.
#[derive(Debug, Clone, Default)]
pub struct EligibilityRanker {
    config: SchedulingConfig,
}

impl EligibilityRanker {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn assess<R>(&self, job: &Job, repository: &R) -> Result<EligibilityReport, RepositoryError>
    where
        R: SchedulingRepository + ?Sized,
    {
        let Some(target) = job.location else {
            debug!(job_id = %job.id, "job has no coordinates; nothing to rank");
            return Ok(EligibilityReport::unlocated(job.id.clone()));
        };

        let interval = job.interval();
        let mut exclusions = Vec::new();

        let mut in_play = Vec::new();
        for technician in repository.list_active_technicians()? {
            match stages::check_reach(&technician, &target) {
                Ok(distance_km) => in_play.push((technician.id, distance_km)),
                Err(reason) => exclude(job, &mut exclusions, technician.id, reason),
            }
        }

        if !in_play.is_empty() {
            let windows = repository.availability_windows_for(&ids(&in_play), &interval)?;
            in_play = retain_passing(job, in_play, &mut exclusions, |technician| {
                let windows = windows.get(technician).map(Vec::as_slice).unwrap_or(&[]);
                stages::check_availability(windows, &interval, self.config.window_policy)
            });
        }

        if !in_play.is_empty() {
            let commitments = repository.active_jobs_for(&ids(&in_play), &interval)?;
            in_play = retain_passing(job, in_play, &mut exclusions, |technician| {
                let commitments = commitments
                    .get(technician)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                stages::check_commitments(job, commitments)
            });
        }

        let mut candidates = Vec::with_capacity(in_play.len());
        if !in_play.is_empty() {
            let day = CalendarDay::containing(job.start, self.config.day_offset);
            let loads = repository.same_day_loads(&ids(&in_play), &day)?;
            for (technician_id, distance_km) in in_play {
                let same_day_load = loads.get(&technician_id).copied().unwrap_or(0);
                candidates.push(CandidateTechnician {
                    technician_id,
                    distance_km,
                    same_day_load,
                });
            }
        }

        sort_candidates(&mut candidates);
        debug!(
            job_id = %job.id,
            candidates = candidates.len(),
            excluded = exclusions.len(),
            policy = self.config.window_policy.label(),
            "eligibility ranking finished"
        );

        Ok(EligibilityReport {
            job_id: job.id.clone(),
            job_located: true,
            candidates,
            exclusions,
        })
    }
}

/// Nearest first, then lightest same-day load, then technician id.
pub fn sort_candidates(candidates: &mut [CandidateTechnician]) {
    candidates.sort_by(compare_candidates);
}

fn compare_candidates(a: &CandidateTechnician, b: &CandidateTechnician) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then(a.same_day_load.cmp(&b.same_day_load))
        .then_with(|| a.technician_id.cmp(&b.technician_id))
}

fn ids(in_play: &[(TechnicianId, f64)]) -> Vec<TechnicianId> {
    in_play.iter().map(|(id, _)| id.clone()).collect()
}

fn retain_passing<F>(
    job: &Job,
    in_play: Vec<(TechnicianId, f64)>,
    exclusions: &mut Vec<Exclusion>,
    check: F,
) -> Vec<(TechnicianId, f64)>
where
    F: Fn(&TechnicianId) -> Result<(), ExclusionReason>,
{
    let mut passing = Vec::with_capacity(in_play.len());
    for (technician_id, distance_km) in in_play {
        match check(&technician_id) {
            Ok(()) => passing.push((technician_id, distance_km)),
            Err(reason) => exclude(job, exclusions, technician_id, reason),
        }
    }
    passing
}

fn exclude(
    job: &Job,
    exclusions: &mut Vec<Exclusion>,
    technician_id: TechnicianId,
    reason: ExclusionReason,
) {
    debug!(
        job_id = %job.id,
        technician_id = %technician_id,
        reason = %reason.summary(),
        "technician excluded"
    );
    exclusions.push(Exclusion {
        technician_id,
        reason,
    });
}
