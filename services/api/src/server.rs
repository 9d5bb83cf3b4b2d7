use crate::cli::ServeArgs;
use crate::demo::demo_store;
use crate::infra::{AppState, InMemoryDispatchStore};
use crate::routes::with_scheduling_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use fieldops::config::AppConfig;
use fieldops::error::AppError;
use fieldops::scheduling::{AssignmentService, DailyAvailability, TechnicianId, TechnicianRoster};
use fieldops::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

const ROSTER_ROLLOUT_DAYS: u32 = 7;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let offset = config.scheduling.day_offset;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let store = match args.roster.take() {
        Some(path) => {
            let technicians = TechnicianRoster::from_path(&path)?;
            let ids: Vec<TechnicianId> = technicians.iter().map(|tech| tech.id.clone()).collect();
            let windows = DailyAvailability::standard().windows_for_days(
                &ids,
                today,
                ROSTER_ROLLOUT_DAYS,
                offset,
            );
            info!(
                roster = %path.display(),
                technicians = ids.len(),
                windows = windows.len(),
                "roster imported"
            );
            let store = InMemoryDispatchStore::default();
            store.seed(technicians, windows, Vec::new());
            store
        }
        None => {
            info!(%today, "seeding demo dispatch board");
            demo_store(today)
        }
    };

    let store = Arc::new(store);
    let service = Arc::new(AssignmentService::new(store.clone(), config.scheduling));

    let app = with_scheduling_routes(service, store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        window_policy = config.scheduling.window_policy.label(),
        "field dispatch service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
