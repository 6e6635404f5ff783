use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::LedgerConfig;
use crate::workflows::portfolio::domain::{
    BillingPeriod, Client, ClientId, ClientSubmission, ContactDetails, FinancialSnapshot,
    PaymentId, PaymentRecord, PaymentStanding, PaymentState, PaymentSubmission,
};
use crate::workflows::portfolio::evaluation::{CreditEvaluator, EvaluationConfig, Verdict};
use crate::workflows::portfolio::repository::{
    ClientRepository, PaymentRepository, RepositoryError,
};
use crate::workflows::portfolio::{portfolio_router, LoanPortfolioService};

pub(super) type MemoryService = LoanPortfolioService<MemoryClients, MemoryPayments>;

pub(super) fn ledger_config() -> LedgerConfig {
    LedgerConfig {
        forecast_horizon: 3,
        currency: "Bs.".to_string(),
    }
}

pub(super) fn evaluator() -> CreditEvaluator {
    CreditEvaluator::new(EvaluationConfig::default())
}

pub(super) fn snapshot(
    salary: f64,
    other_income: f64,
    housing_expense: f64,
    current_state: PaymentStanding,
) -> FinancialSnapshot {
    FinancialSnapshot {
        salary,
        other_income,
        housing_expense,
        has_property: false,
        property_value: 0.0,
        current_state,
    }
}

/// Profile that scores 78.5: good income, moderate expense, no property.
pub(super) fn submission(name: &str) -> ClientSubmission {
    ClientSubmission {
        name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_ascii_lowercase().replace(' ', "."))),
        phone: Some("+591 700 00000".to_string()),
        address: Some("Av. Busch 1200".to_string()),
        current_state: PaymentState::OnTime,
        salary: 3500.0,
        other_income: 500.0,
        housing_expense: 800.0,
        has_property: false,
        property_value: 0.0,
        requested_amount: 12_000.0,
        notes: None,
    }
}

/// Profile that scores 46.5: low income, moderate expense, in default.
pub(super) fn weak_submission(name: &str) -> ClientSubmission {
    ClientSubmission {
        current_state: PaymentState::Defaulted,
        salary: 1500.0,
        other_income: 0.0,
        housing_expense: 900.0,
        ..submission(name)
    }
}

pub(super) fn payment(year: i32, month: u32, state: PaymentState, amount: f64) -> PaymentSubmission {
    PaymentSubmission {
        month,
        year,
        state,
        amount,
        description: None,
    }
}

pub(super) fn client_fixture(
    id: &str,
    name: &str,
    current_state: PaymentState,
    credit_score: f64,
    verdict: Verdict,
) -> Client {
    Client {
        id: ClientId(id.to_string()),
        name: name.to_string(),
        contact: ContactDetails {
            email: Some(format!("{id}@example.com")),
            phone: None,
            address: None,
        },
        salary: 3000.0,
        other_income: 0.0,
        housing_expense: 500.0,
        has_property: false,
        property_value: 0.0,
        current_state,
        requested_amount: 5000.0,
        notes: None,
        registered_on: NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
        credit_score,
        verdict: Some(verdict),
        evaluated_at: None,
        evaluation_record: None,
    }
}

pub(super) fn record_fixture(
    id: &str,
    client_id: &str,
    period: BillingPeriod,
    state: PaymentState,
    amount: f64,
) -> PaymentRecord {
    PaymentRecord {
        id: PaymentId(id.to_string()),
        client_id: ClientId(client_id.to_string()),
        period,
        state,
        amount,
        description: None,
        recorded_at: Utc
            .with_ymd_and_hms(2025, 11, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryClients>, Arc<MemoryPayments>) {
    let clients = Arc::new(MemoryClients::default());
    let payments = Arc::new(MemoryPayments::default());
    let service = LoanPortfolioService::new(clients.clone(), payments.clone(), &ledger_config());
    (service, clients, payments)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    portfolio_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryClients {
    pub(super) records: Arc<Mutex<HashMap<ClientId, Client>>>,
}

impl ClientRepository for MemoryClients {
    fn insert(&self, client: Client) -> Result<Client, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&client.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(client.id.clone(), client.clone());
        Ok(client)
    }

    fn update(&self, client: Client) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&client.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(client.id.clone(), client);
        Ok(())
    }

    fn fetch(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: &ClientId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPayments {
    pub(super) records: Arc<Mutex<HashMap<PaymentId, PaymentRecord>>>,
}

impl MemoryPayments {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl PaymentRepository for MemoryPayments {
    fn insert(&self, record: PaymentRecord) -> Result<PaymentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: PaymentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_client(&self, client_id: &ClientId) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.client_id == client_id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: &PaymentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn remove_for_client(&self, client_id: &ClientId) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|_, record| &record.client_id != client_id);
        Ok(before - guard.len())
    }
}

pub(super) struct ConflictClients;

impl ClientRepository for ConflictClients {
    fn insert(&self, _client: Client) -> Result<Client, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _client: Client) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        Ok(None)
    }

    fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        Ok(Vec::new())
    }

    fn remove(&self, _id: &ClientId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

pub(super) struct UnavailableClients;

impl ClientRepository for UnavailableClients {
    fn insert(&self, _client: Client) -> Result<Client, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _client: Client) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ClientId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn assert_conflict_response(response: Response) {
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
