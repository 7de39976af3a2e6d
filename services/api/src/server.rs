use crate::cli::ServeArgs;
use crate::infra::{load_rule_store, AppState};
use crate::routes::with_match_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use regscope::config::AppConfig;
use regscope::error::AppError;
use regscope::matching::RuleMatcher;
use regscope::telemetry;
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
    if let Some(rules) = args.rules.take() {
        config.matching.rules_path = rules;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(load_rule_store(&config.matching.rules_path)?);
    let matcher = Arc::new(RuleMatcher::new(
        store,
        config.matching.candidate_cache_ttl,
    ));

    let app = with_match_routes(matcher)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        cache_ttl_secs = config.matching.candidate_cache_ttl.as_secs(),
        "rule matching service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
