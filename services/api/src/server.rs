use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryClientRepository, InMemoryPaymentRepository};
use crate::routes::with_portfolio_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_ledger::config::AppConfig;
use loan_ledger::error::AppError;
use loan_ledger::telemetry;
use loan_ledger::workflows::portfolio::LoanPortfolioService;
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
        forecast_horizon: config.ledger.forecast_horizon,
    };

    let clients = Arc::new(InMemoryClientRepository::default());
    let payments = Arc::new(InMemoryPaymentRepository::default());
    let portfolio_service = Arc::new(LoanPortfolioService::new(
        clients,
        payments,
        &config.ledger,
    ));

    let app = with_portfolio_routes(portfolio_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        currency = %config.ledger.currency,
        forecast_horizon = config.ledger.forecast_horizon,
        "loan ledger service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
