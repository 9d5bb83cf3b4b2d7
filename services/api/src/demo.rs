use crate::infra::{parse_date, parse_instant, InMemoryDispatchStore};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use clap::Args;
use fieldops::config::AppConfig;
use fieldops::error::AppError;
use fieldops::scheduling::interval::local_to_utc;
use fieldops::scheduling::{
    decide, AssignmentDecision, AssignmentService, AssignmentWriter, DailyAvailability,
    EligibilityReport, GeoPoint, Job, JobId, JobStatus, RepositoryError, SchedulingConfig,
    SchedulingError, Technician, TechnicianId, TechnicianRoster, WindowPolicy,
};
use std::path::PathBuf;
use std::sync::Arc;

const KUALA_LUMPUR_OFFSET_SECONDS: i32 = 8 * 3600;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Dispatch date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Window policy override: overlap or fully_covers.
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<WindowPolicy>,
}

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// Roster CSV export (id,name,latitude,longitude,service_radius_km,is_available)
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Job site latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) job_lat: f64,
    /// Job site longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) job_lng: f64,
    /// Job start (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    pub(crate) start: DateTime<Utc>,
    /// Job end (RFC 3339). Defaults to start + 60 minutes.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) end: Option<DateTime<Utc>>,
    /// Window policy override: overlap or fully_covers.
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<WindowPolicy>,
}

pub(crate) fn parse_policy(raw: &str) -> Result<WindowPolicy, String> {
    WindowPolicy::parse(raw).ok_or_else(|| {
        format!("unknown window policy '{raw}' (expected overlap or fully_covers)")
    })
}

pub(crate) fn kuala_lumpur() -> FixedOffset {
    FixedOffset::east_opt(KUALA_LUMPUR_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Calendar date on the Kuala Lumpur dispatch board at `now`.
pub(crate) fn board_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&kuala_lumpur()).date_naive()
}

fn local(date: NaiveDate, hour: i64, minute: i64) -> DateTime<Utc> {
    let time = NaiveTime::MIN + Duration::minutes(hour * 60 + minute);
    local_to_utc(date, time, kuala_lumpur())
}

fn scheduling_config(policy: Option<WindowPolicy>) -> Result<SchedulingConfig, AppError> {
    let config = AppConfig::load()?.scheduling;
    Ok(match policy {
        Some(policy) => config.with_policy(policy),
        None => config,
    })
}

/// Ranks a single ad-hoc job against a roster export. Every technician on the
/// roster works the standard daily shift around the job's start.
pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let RankArgs {
        roster,
        job_lat,
        job_lng,
        start,
        end,
        policy,
    } = args;

    let config = scheduling_config(policy)?;
    let technicians = TechnicianRoster::from_path(roster)?;
    let ids: Vec<TechnicianId> = technicians.iter().map(|tech| tech.id.clone()).collect();
    let first_day = start
        .with_timezone(&config.day_offset)
        .date_naive()
        .pred_opt()
        .unwrap_or(NaiveDate::MIN);
    let windows =
        DailyAvailability::standard().windows_for_days(&ids, first_day, 3, config.day_offset);

    let store = InMemoryDispatchStore::default();
    store.seed(technicians, windows, Vec::new());
    let service = AssignmentService::new(Arc::new(store), config);

    let job = Job {
        id: JobId("adhoc".to_string()),
        location: Some(GeoPoint::new(job_lat, job_lng)),
        start,
        end,
        technician_id: None,
        status: JobStatus::Pending,
    };

    println!(
        "Ranking job at ({:.4}, {:.4}) starting {} | window policy {}",
        job_lat,
        job_lng,
        job.start.to_rfc3339(),
        config.window_policy.label()
    );
    let report = service.assess_job(&job)?;
    render_report(&report);
    println!("Decision: {}", decide(report).summary());
    Ok(())
}

/// Seeds a Kuala Lumpur crew and walks the open jobs in id order, committing
/// each assignment before ranking the next one.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, policy } = args;
    let date = date.unwrap_or_else(|| board_date(Utc::now()));
    let config = scheduling_config(policy)?.with_day_offset(kuala_lumpur());

    let store = Arc::new(demo_store(date));
    let service = AssignmentService::new(store.clone(), config);

    println!(
        "Field dispatch demo for {} | {} technicians | window policy {}",
        date,
        store.technician_ids().len(),
        config.window_policy.label()
    );

    for outcome in dispatch_open_jobs(&service, store.as_ref())? {
        println!("\nJob {}", outcome.job_id);
        render_report(&outcome.report);
        match outcome.committed {
            Ok(()) => println!("  Decision: {}", outcome.decision.summary()),
            Err(err) => println!(
                "  Decision: {} (not committed: {})",
                outcome.decision.summary(),
                err
            ),
        }
    }
    Ok(())
}

pub(crate) struct DispatchOutcome {
    pub(crate) job_id: JobId,
    pub(crate) report: EligibilityReport,
    pub(crate) decision: AssignmentDecision,
    pub(crate) committed: Result<(), RepositoryError>,
}

pub(crate) fn dispatch_open_jobs(
    service: &AssignmentService<InMemoryDispatchStore>,
    store: &InMemoryDispatchStore,
) -> Result<Vec<DispatchOutcome>, SchedulingError> {
    let mut outcomes = Vec::new();
    for job_id in store.job_ids() {
        let open = store
            .job(&job_id)
            .is_some_and(|job| job.technician_id.is_none() && job.is_active());
        if !open {
            continue;
        }

        let report = service.assess(&job_id)?;
        let decision = decide(report.clone());
        let committed = match decision.technician_id() {
            Some(technician) => store.assign_technician(&job_id, technician),
            None => Ok(()),
        };
        outcomes.push(DispatchOutcome {
            job_id,
            report,
            decision,
            committed,
        });
    }
    Ok(outcomes)
}

fn render_report(report: &EligibilityReport) {
    if !report.job_located {
        println!("  Job has no coordinates; nothing to rank");
        return;
    }

    if report.candidates.is_empty() {
        println!("  No eligible technicians");
    } else {
        println!("  Candidates (nearest first):");
        for (rank, candidate) in report.candidates.iter().enumerate() {
            println!(
                "    {}. {} | {:.2} km | {} jobs that day",
                rank + 1,
                candidate.technician_id,
                candidate.distance_km,
                candidate.same_day_load
            );
        }
    }

    if !report.exclusions.is_empty() {
        println!("  Excluded:");
        for exclusion in &report.exclusions {
            println!(
                "    - {}: {}",
                exclusion.technician_id,
                exclusion.reason.summary()
            );
        }
    }
}

fn crew_member(
    id: &str,
    name: &str,
    home: Option<GeoPoint>,
    radius_km: Option<f64>,
    is_available: bool,
) -> Technician {
    Technician {
        id: TechnicianId(id.to_string()),
        name: name.to_string(),
        home,
        service_radius_km: radius_km,
        is_available,
    }
}

pub(crate) fn demo_roster() -> Vec<Technician> {
    vec![
        crew_member(
            "tech-aina",
            "Aina Rahman",
            Some(GeoPoint::new(3.1390, 101.6869)),
            Some(25.0),
            true,
        ),
        crew_member(
            "tech-daniel",
            "Daniel Tan",
            Some(GeoPoint::new(3.1073, 101.6085)),
            Some(15.0),
            true,
        ),
        crew_member(
            "tech-priya",
            "Priya Nair",
            Some(GeoPoint::new(3.0567, 101.5851)),
            Some(12.0),
            true,
        ),
        crew_member(
            "tech-hafiz",
            "Hafiz Ismail",
            Some(GeoPoint::new(3.0733, 101.5185)),
            Some(20.0),
            false,
        ),
        crew_member("tech-mei", "Mei Lin", None, Some(10.0), true),
    ]
}

fn site_visit(
    id: &str,
    site: Option<GeoPoint>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Job {
    Job {
        id: JobId(id.to_string()),
        location: site,
        start,
        end,
        technician_id: None,
        status: JobStatus::Pending,
    }
}

pub(crate) fn demo_jobs(date: NaiveDate) -> Vec<Job> {
    let mut maintenance = site_visit(
        "job-maint-daniel",
        Some(GeoPoint::new(3.1073, 101.6085)),
        local(date, 8, 30),
        Some(local(date, 9, 30)),
    );
    maintenance.technician_id = Some(TechnicianId("tech-daniel".to_string()));
    maintenance.status = JobStatus::InProgress;

    vec![
        maintenance,
        site_visit(
            "job-aircon-pj",
            Some(GeoPoint::new(3.1100, 101.6200)),
            local(date, 9, 0),
            Some(local(date, 11, 0)),
        ),
        site_visit(
            "job-lift-klcc",
            Some(GeoPoint::new(3.1579, 101.7116)),
            local(date, 9, 30),
            Some(local(date, 10, 30)),
        ),
        site_visit(
            "job-boiler-subang",
            Some(GeoPoint::new(3.0500, 101.5800)),
            local(date, 14, 0),
            None,
        ),
        site_visit(
            "job-remote-ipoh",
            Some(GeoPoint::new(4.5975, 101.0901)),
            local(date, 10, 0),
            Some(local(date, 12, 0)),
        ),
        site_visit("job-unmapped", None, local(date, 16, 0), None),
    ]
}

/// Demo crew, their standard shifts for `date` and the day after, and the
/// day's job sheet.
pub(crate) fn demo_store(date: NaiveDate) -> InMemoryDispatchStore {
    let roster = demo_roster();
    let ids: Vec<TechnicianId> = roster.iter().map(|tech| tech.id.clone()).collect();
    let windows = DailyAvailability::standard().windows_for_days(&ids, date, 2, kuala_lumpur());

    let store = InMemoryDispatchStore::default();
    store.seed(roster, windows, demo_jobs(date));
    store
}
