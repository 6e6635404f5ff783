use crate::infra::{forecast_from_ledger, AppState, LedgerForecast};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_ledger::error::AppError;
use loan_ledger::workflows::ledger_csv::LedgerCsvImporter;
use loan_ledger::workflows::portfolio::forecast::checked_horizon;
use loan_ledger::workflows::portfolio::{
    portfolio_router, ClientRepository, LoanPortfolioService, PaymentRepository,
    PortfolioServiceError,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerForecastRequest {
    pub(crate) ledger_csv: String,
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) horizon: Option<usize>,
}

pub(crate) fn with_portfolio_routes<C, P>(
    service: Arc<LoanPortfolioService<C, P>>,
) -> axum::Router
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    portfolio_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/forecasts/ledger",
            axum::routing::post(ledger_forecast_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Trains a throwaway predictor on the posted ledger; nothing is stored.
pub(crate) async fn ledger_forecast_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LedgerForecastRequest>,
) -> Result<Json<LedgerForecast>, AppError> {
    let LedgerForecastRequest {
        ledger_csv,
        state: current,
        horizon,
    } = payload;

    let horizon = checked_horizon(horizon.unwrap_or(state.forecast_horizon))
        .map_err(PortfolioServiceError::from)?;
    let reader = Cursor::new(ledger_csv.into_bytes());
    let entries = LedgerCsvImporter::from_reader(reader)?;

    Ok(Json(forecast_from_ledger(&entries, &current, horizon)))
}
