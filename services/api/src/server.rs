use crate::cli::ServeArgs;
use crate::infra::{AppState, CaseServices};
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use haulcare::config::AppConfig;
use haulcare::error::AppError;
use haulcare::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let services = CaseServices::in_memory(&config.security, &config.intake);
    if let Some(seed) = &config.security.seed_admin {
        services.seed_admin(seed)?;
    }
    if config.security.api_key.is_none() {
        warn!("APP_API_KEY is not set; scheduled reminder requests will be refused");
    }

    let app = with_case_routes(&services, config.security.api_key.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "case management service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
