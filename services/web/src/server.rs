use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use salary_predictor::config::AppConfig;
use salary_predictor::error::AppError;
use salary_predictor::predictor::{HttpPredictionClient, PredictionFormService};
use salary_predictor::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    if let Some(api_url) = args.api_url.take() {
        config.prediction.override_base_url(&api_url)?;
    }

    telemetry::init(&config.telemetry)?;

    let client = HttpPredictionClient::new(&config.prediction)?;
    info!(
        endpoint = client.endpoint(),
        source = ?config.prediction.source,
        log_requests = config.prediction.log_requests,
        "prediction endpoint configured"
    );
    let form_service = Arc::new(PredictionFormService::new(client));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_prediction_routes(form_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "salary predictor ready");

    axum::serve(listener, app).await?;
    Ok(())
}
