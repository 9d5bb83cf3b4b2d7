use super::common::*;
use std::sync::Arc;

use crate::scheduling::domain::Job;
use crate::scheduling::repository::RepositoryError;
use crate::scheduling::service::decide;
use crate::scheduling::{
    AssignmentDecision, AssignmentService, SchedulingConfig, SchedulingError, UnassignedReason,
};

#[test]
fn find_eligible_technicians_loads_the_stored_job() {
    let (service, _) = service_for(scenario_a_repository());

    let candidates = service
        .find_eligible_technicians(&job_id("job-1"))
        .expect("ranking succeeds");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].technician_id, tech_id("tech-aina"));
}

#[test]
fn auto_assign_picks_the_top_candidate_without_writing() {
    let (service, repository) = service_for(
        scenario_a_repository()
            .with_technician(technician("tech-ben", JOB_SITE, 10.0))
            .with_window(working_hours("tech-ben")),
    );

    let decision = service
        .auto_assign_technician(&job_id("job-1"))
        .expect("decision made");

    assert_eq!(decision.technician_id(), Some(&tech_id("tech-ben")));
    let stored = repository.job(&job_id("job-1")).expect("job present");
    assert_eq!(stored.technician_id, None, "the service never persists");
}

#[test]
fn auto_assign_reports_missing_location() {
    let (service, _) = service_for(scenario_a_repository().with_job(Job {
        location: None,
        ..job("job-unlocated", at(9, 0), None)
    }));

    let decision = service
        .auto_assign_technician(&job_id("job-unlocated"))
        .expect("decision made");

    assert_eq!(
        decision,
        AssignmentDecision::Unassigned {
            reason: UnassignedReason::MissingJobLocation
        }
    );
    assert_eq!(decision.technician_id(), None);
}

#[test]
fn auto_assign_returns_none_when_every_technician_is_out_of_range() {
    let (service, _) = service_for(scenario_a_repository().with_job(Job {
        location: Some(MELAKA),
        ..job("job-far", at(14, 0), Some(at(15, 0)))
    }));

    let decision = service
        .auto_assign_technician(&job_id("job-far"))
        .expect("decision made");

    assert_eq!(decision.technician_id(), None);
    assert!(decision.summary().contains("no suitable technician"));
}

#[test]
fn unknown_job_is_reported() {
    let (service, _) = service_for(scenario_a_repository());

    match service.auto_assign_technician(&job_id("job-missing")) {
        Err(SchedulingError::JobNotFound(id)) => assert_eq!(id, job_id("job-missing")),
        other => panic!("expected job not found, got {other:?}"),
    }
}

#[test]
fn datastore_failures_propagate_unchanged() {
    let service = AssignmentService::new(Arc::new(UnavailableRepository), SchedulingConfig::default());

    match service.find_eligible_technicians(&job_id("job-1")) {
        Err(SchedulingError::Repository(RepositoryError::Unavailable(message))) => {
            assert_eq!(message, "database offline");
        }
        other => panic!("expected repository error, got {other:?}"),
    }
}

#[test]
fn decide_prefers_the_first_candidate() {
    let (service, _) = service_for(
        scenario_a_repository()
            .with_technician(technician("tech-ben", NORTH_OF_SITE, 10.0))
            .with_window(working_hours("tech-ben")),
    );
    let report = service.assess(&job_id("job-1")).expect("ranking succeeds");
    assert_eq!(report.candidates.len(), 2);

    match decide(report) {
        AssignmentDecision::Assigned(candidate) => {
            assert_eq!(candidate.technician_id, tech_id("tech-ben"));
            assert!(candidate.distance_km < 3.1);
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}
