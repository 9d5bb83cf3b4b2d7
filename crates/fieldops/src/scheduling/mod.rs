//! Technician eligibility ranking and auto-assignment.
//!
//! Leaves first: [`geo`] measures distance, [`interval`] answers overlap
//! questions, [`eligibility`] filters and orders the technician pool, and
//! [`service`] turns a ranking into an assignment decision. Datastore access
//! is injected through the traits in [`repository`].

pub mod availability;
pub mod domain;
pub mod eligibility;
pub mod geo;
pub mod interval;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use availability::DailyAvailability;
pub use domain::{
    AvailabilityWindow, CandidateTechnician, Job, JobId, JobStatus, Technician, TechnicianId,
};
pub use eligibility::{
    EligibilityRanker, EligibilityReport, Exclusion, ExclusionReason, SchedulingConfig,
    WindowPolicy,
};
pub use geo::{distance_km, GeoPoint};
pub use interval::{fully_covers, overlaps, CalendarDay, TimeRange};
pub use repository::{AssignmentWriter, RepositoryError, SchedulingRepository};
pub use roster::{RosterImportError, TechnicianRoster};
pub use router::scheduling_router;
pub use service::{
    decide, AssignmentDecision, AssignmentService, SchedulingError, UnassignedReason,
};
