use serde::Serialize;

use super::super::domain::{AvailabilityWindow, Job, JobId, Technician, TechnicianId};
use super::super::geo::GeoPoint;
use super::super::interval::{overlaps, TimeRange};
use super::policy::WindowPolicy;

/// Why a technician dropped out of the candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    Unavailable,
    MissingHomeLocation,
    MissingServiceRadius,
    OutsideServiceRadius { distance_km: f64, radius_km: f64 },
    NoAvailabilityWindow,
    OutsideAvailability,
    ScheduleConflict { job_id: JobId },
}

impl ExclusionReason {
    pub fn summary(&self) -> String {
        match self {
            ExclusionReason::Unavailable => "marked unavailable".to_string(),
            ExclusionReason::MissingHomeLocation => "no home location on file".to_string(),
            ExclusionReason::MissingServiceRadius => "no service radius configured".to_string(),
            ExclusionReason::OutsideServiceRadius {
                distance_km,
                radius_km,
            } => format!(
                "job is {:.1} km away, beyond the {:.1} km service radius",
                distance_km, radius_km
            ),
            ExclusionReason::NoAvailabilityWindow => {
                "no availability window near the job time".to_string()
            }
            ExclusionReason::OutsideAvailability => {
                "job falls outside every availability window".to_string()
            }
            ExclusionReason::ScheduleConflict { job_id } => {
                format!("already booked on overlapping job {job_id}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub technician_id: TechnicianId,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Stages one to three: availability flag, profile completeness and radius.
pub(crate) fn check_reach(
    technician: &Technician,
    target: &GeoPoint,
) -> Result<f64, ExclusionReason> {
    if !technician.is_available {
        return Err(ExclusionReason::Unavailable);
    }

    let home = technician
        .home
        .ok_or(ExclusionReason::MissingHomeLocation)?;
    let radius_km = technician
        .usable_radius_km()
        .ok_or(ExclusionReason::MissingServiceRadius)?;

    let distance_km = home.distance_to(target);
    // NaN coordinates fail this comparison and are excluded with the rest.
    if distance_km <= radius_km {
        Ok(distance_km)
    } else {
        Err(ExclusionReason::OutsideServiceRadius {
            distance_km,
            radius_km,
        })
    }
}

/// Stage four: at least one nearby window must admit the job.
pub(crate) fn check_availability(
    windows: &[AvailabilityWindow],
    job: &TimeRange,
    policy: WindowPolicy,
) -> Result<(), ExclusionReason> {
    let mut nearby = windows
        .iter()
        .map(AvailabilityWindow::range)
        .filter(|window| window.overlaps(job))
        .peekable();

    if nearby.peek().is_none() {
        return Err(ExclusionReason::NoAvailabilityWindow);
    }

    if nearby.any(|window| policy.admits(&window, job)) {
        Ok(())
    } else {
        Err(ExclusionReason::OutsideAvailability)
    }
}

/// Stage five: no overlapping active commitment other than the job itself.
pub(crate) fn check_commitments(job: &Job, commitments: &[Job]) -> Result<(), ExclusionReason> {
    let job_end = job.effective_end();
    let conflict = commitments
        .iter()
        .filter(|existing| existing.id != job.id && existing.is_active())
        .find(|existing| overlaps(existing.start, existing.end, job.start, job_end));

    match conflict {
        Some(existing) => Err(ExclusionReason::ScheduleConflict {
            job_id: existing.id.clone(),
        }),
        None => Ok(()),
    }
}
