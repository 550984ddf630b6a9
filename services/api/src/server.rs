use crate::cli::ServeArgs;
use crate::infra::{AppState, RouteSettings};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use uplift_policy::config::AppConfig;
use uplift_policy::error::AppError;
use uplift_policy::models::ModelBundle;
use uplift_policy::scoring::ScoringService;
use uplift_policy::telemetry;

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

    let bundle = ModelBundle::load(&config.scoring.model_dir)?;
    let scoring_service = Arc::new(ScoringService::from_bundle(
        bundle,
        config.scoring.settings(),
    ));
    let route_settings = RouteSettings::from(&config.scoring);

    let app = with_scoring_routes(scoring_service, route_settings)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model_dir = %config.scoring.model_dir.display(),
        "uplift scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
