use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AssessmentRequest, BillingPeriod, ClientId, ClientSubmission, PaymentId, PaymentRevision,
    PaymentState, PaymentSubmission,
};
use super::repository::{ClientRepository, PaymentRepository, RepositoryError};
use super::service::{LoanPortfolioService, PortfolioServiceError};
use crate::workflows::ledger_csv::LedgerImportError;

type SharedService<C, P> = State<Arc<LoanPortfolioService<C, P>>>;

/// Router builder exposing the portfolio endpoints.
pub fn portfolio_router<C, P>(service: Arc<LoanPortfolioService<C, P>>) -> Router
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/clients",
            post(register_handler::<C, P>).get(list_handler::<C, P>),
        )
        .route(
            "/api/v1/clients/:client_id",
            get(client_handler::<C, P>)
                .put(update_handler::<C, P>)
                .delete(remove_client_handler::<C, P>),
        )
        .route(
            "/api/v1/clients/:client_id/payments",
            post(record_payment_handler::<C, P>).get(client_payments_handler::<C, P>),
        )
        .route(
            "/api/v1/clients/:client_id/statement",
            get(statement_handler::<C, P>),
        )
        .route(
            "/api/v1/clients/:client_id/forecast",
            get(forecast_handler::<C, P>),
        )
        .route(
            "/api/v1/payments/:payment_id",
            put(revise_payment_handler::<C, P>).delete(remove_payment_handler::<C, P>),
        )
        .route(
            "/api/v1/payments/:payment_id/state",
            put(payment_state_handler::<C, P>),
        )
        .route("/api/v1/assessments", post(assess_handler::<C, P>))
        .route("/api/v1/dashboard", get(dashboard_handler::<C, P>))
        .route(
            "/api/v1/reports/payments.csv",
            get(export_handler::<C, P>),
        )
        .route("/api/v1/ledger/import", post(import_handler::<C, P>))
        .with_state(service)
}

/// HTTP status for a service failure.
pub fn status_for(error: &PortfolioServiceError) -> StatusCode {
    match error {
        PortfolioServiceError::Intake(_)
        | PortfolioServiceError::Evaluation(_)
        | PortfolioServiceError::Horizon(_)
        | PortfolioServiceError::Import(LedgerImportError::InvalidRow { .. })
        | PortfolioServiceError::Import(LedgerImportError::Csv(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PortfolioServiceError::ClientNotFound(_)
        | PortfolioServiceError::PaymentNotFound(_)
        | PortfolioServiceError::NoPaymentHistory(_)
        | PortfolioServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PortfolioServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: PortfolioServiceError) -> Response {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "portfolio request failed");
    }

    let payload = match &error {
        PortfolioServiceError::NoPaymentHistory(client_id) => json!({
            "error": error.to_string(),
            "client_id": client_id,
            "hint": "record at least one payment before requesting a forecast",
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, PortfolioServiceError>,
) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientFilter {
    #[serde(default)]
    state: Option<PaymentState>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HorizonQuery {
    #[serde(default)]
    horizon: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PeriodQuery {
    #[serde(default)]
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StateChange {
    state: PaymentState,
}

pub(crate) async fn register_handler<C, P>(
    State(service): SharedService<C, P>,
    axum::Json(submission): axum::Json<ClientSubmission>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(StatusCode::CREATED, service.register_client(submission))
}

pub(crate) async fn list_handler<C, P>(
    State(service): SharedService<C, P>,
    Query(filter): Query<ClientFilter>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(StatusCode::OK, service.list_clients(filter.state))
}

pub(crate) async fn client_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(StatusCode::OK, service.get_client(&ClientId(client_id)))
}

pub(crate) async fn update_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
    axum::Json(submission): axum::Json<ClientSubmission>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_client(&ClientId(client_id), submission),
    )
}

pub(crate) async fn remove_client_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let id = ClientId(client_id);
    let result = service.remove_client(&id).map(|payments_removed| {
        json!({
            "client_id": id,
            "payments_removed": payments_removed,
        })
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn record_payment_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
    axum::Json(submission): axum::Json<PaymentSubmission>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.record_payment(&ClientId(client_id), submission),
    )
}

pub(crate) async fn client_payments_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(StatusCode::OK, service.client_payments(&ClientId(client_id)))
}

pub(crate) async fn statement_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    respond(
        StatusCode::OK,
        service.statement(&ClientId(client_id), as_of),
    )
}

pub(crate) async fn forecast_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(client_id): Path<String>,
    Query(query): Query<HorizonQuery>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.forecast_client(&ClientId(client_id), query.horizon),
    )
}

pub(crate) async fn revise_payment_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(payment_id): Path<String>,
    axum::Json(revision): axum::Json<PaymentRevision>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.revise_payment(&PaymentId(payment_id), revision),
    )
}

pub(crate) async fn remove_payment_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(payment_id): Path<String>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let id = PaymentId(payment_id);
    let result = service
        .remove_payment(&id)
        .map(|()| json!({ "payment_id": id, "removed": true }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn payment_state_handler<C, P>(
    State(service): SharedService<C, P>,
    Path(payment_id): Path<String>,
    axum::Json(change): axum::Json<StateChange>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.set_payment_state(&PaymentId(payment_id), change.state),
    )
}

pub(crate) async fn assess_handler<C, P>(
    State(service): SharedService<C, P>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    respond(StatusCode::OK, service.assess(&request))
}

pub(crate) async fn dashboard_handler<C, P>(
    State(service): SharedService<C, P>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let period = match query.period.as_deref() {
        Some(raw) => match raw.parse::<BillingPeriod>() {
            Ok(period) => period,
            Err(reason) => {
                let payload = json!({ "error": reason });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
        None => {
            let today = Utc::now().date_naive();
            BillingPeriod::new(today.year(), today.month())
        }
    };
    respond(StatusCode::OK, service.dashboard(period))
}

pub(crate) async fn export_handler<C, P>(State(service): SharedService<C, P>) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let mut buffer = Vec::new();
    match service.export_ledger(&mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"payments.csv\"",
                ),
            ],
            buffer,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_handler<C, P>(
    State(service): SharedService<C, P>,
    body: String,
) -> Response
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    let result = service
        .import_ledger(body.as_bytes())
        .map(|imported| json!({ "imported": imported }));
    respond(StatusCode::CREATED, result)
}
