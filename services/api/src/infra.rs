use chrono::NaiveDate;
use loan_ledger::workflows::ledger_csv::LedgerEntry;
use loan_ledger::workflows::portfolio::forecast::{risk_of_label, training_sequences};
use loan_ledger::workflows::portfolio::service::RowSourceEntry;
use loan_ledger::workflows::portfolio::{
    Client, ClientId, ClientRepository, Forecast, MarkovPredictor, PaymentId, PaymentRecord,
    PaymentRepository, PaymentState, RepositoryError, RiskAssessment, TransitionMatrix,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) forecast_horizon: usize,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryClientRepository {
    records: Arc<Mutex<HashMap<ClientId, Client>>>,
}

impl ClientRepository for InMemoryClientRepository {
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
        if guard.contains_key(&client.id) {
            guard.insert(client.id.clone(), client);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPaymentRepository {
    records: Arc<Mutex<HashMap<PaymentId, PaymentRecord>>>,
}

impl PaymentRepository for InMemoryPaymentRepository {
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
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn remove_for_client(&self, client_id: &ClientId) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|_, record| &record.client_id != client_id);
        Ok(before - guard.len())
    }
}

/// Forecast trained on a standalone ledger file rather than the stored portfolio.
#[derive(Debug, Serialize)]
pub(crate) struct LedgerForecast {
    pub(crate) state: String,
    pub(crate) current_risk: RiskAssessment,
    pub(crate) horizon: usize,
    pub(crate) rows: usize,
    pub(crate) sequences: usize,
    pub(crate) transitions_observed: u32,
    pub(crate) forecast: Forecast,
    pub(crate) matrix: TransitionMatrix,
    pub(crate) row_sources: Vec<RowSourceEntry>,
}

pub(crate) fn forecast_from_ledger(
    entries: &[LedgerEntry],
    state: &str,
    horizon: usize,
) -> LedgerForecast {
    let sequences = training_sequences(entries);
    let predictor = MarkovPredictor::train(&sequences);

    LedgerForecast {
        state: state.trim().to_string(),
        current_risk: risk_of_label(state),
        horizon,
        rows: entries.len(),
        sequences: sequences.len(),
        transitions_observed: predictor.transitions_observed(),
        forecast: predictor.predict_label(state, horizon),
        matrix: *predictor.matrix(),
        row_sources: PaymentState::ordered()
            .into_iter()
            .map(|from| RowSourceEntry {
                state: from,
                source: predictor.row_source(from),
            })
            .collect(),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
