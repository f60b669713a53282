use crate::cli::ServeArgs;
use crate::infra::{seeded_store, AppState};
use crate::routes::with_engine_routes;
use agile_affinity::config::AppConfig;
use agile_affinity::engine::AffinityService;
use agile_affinity::error::AppError;
use agile_affinity::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(seeded_store());
    let affinity_service = Arc::new(AffinityService::new(store, config.engine.clone()));

    let app = with_engine_routes(affinity_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        min_threshold = config.engine.default_min_threshold,
        min_improvement = config.engine.default_min_improvement,
        "agile affinity service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
