use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::config::LedgerConfig;
use crate::workflows::ledger_csv::{self, LedgerCsvImporter, LedgerImportError};

use super::domain::{
    AssessmentRequest, BillingPeriod, Client, ClientId, ClientSubmission, ContactDetails,
    PaymentId, PaymentRecord, PaymentRevision, PaymentStanding, PaymentState, PaymentSubmission,
};
use super::evaluation::{CreditEvaluation, CreditEvaluator, EvaluationConfig, EvaluationError};
use super::forecast::{
    checked_horizon, latest_state, risk_of, training_sequences, Forecast, HorizonOutOfRange,
    MarkovPredictor, RiskAssessment, RowSource, TransitionMatrix,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::report::{self, ClientStatement, DashboardSummary};
use super::repository::{ClientOverview, ClientRepository, PaymentRepository, RepositoryError};

/// Service composing intake validation, storage, the credit evaluator and the predictor.
pub struct LoanPortfolioService<C, P> {
    guard: Arc<IntakeGuard>,
    clients: Arc<C>,
    payments: Arc<P>,
    evaluator: Arc<CreditEvaluator>,
    forecast_horizon: usize,
}

static CLIENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = CLIENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ClientId(format!("cli-{id:06}"))
}

fn next_payment_id() -> PaymentId {
    let id = PAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PaymentId(format!("pay-{id:06}"))
}

impl<C, P> LoanPortfolioService<C, P>
where
    C: ClientRepository + 'static,
    P: PaymentRepository + 'static,
{
    pub fn new(clients: Arc<C>, payments: Arc<P>, config: &LedgerConfig) -> Self {
        Self::with_evaluation(
            clients,
            payments,
            EvaluationConfig::with_currency(config.currency.clone()),
            config.forecast_horizon,
        )
    }

    pub fn with_evaluation(
        clients: Arc<C>,
        payments: Arc<P>,
        evaluation: EvaluationConfig,
        forecast_horizon: usize,
    ) -> Self {
        Self {
            guard: Arc::new(IntakeGuard::default()),
            clients,
            payments,
            evaluator: Arc::new(CreditEvaluator::new(evaluation)),
            forecast_horizon,
        }
    }

    pub fn evaluator(&self) -> &CreditEvaluator {
        &self.evaluator
    }

    pub fn forecast_horizon(&self) -> usize {
        self.forecast_horizon
    }

    /// Validate, evaluate and store a new client.
    pub fn register_client(
        &self,
        submission: ClientSubmission,
    ) -> Result<Client, PortfolioServiceError> {
        let submission = self.guard.client_submission(submission)?;
        let client = self.evaluated_client(
            next_client_id(),
            submission,
            Utc::now().date_naive(),
        )?;

        let stored = self.clients.insert(client)?;
        tracing::info!(
            client_id = %stored.id,
            score = stored.credit_score,
            verdict = stored.verdict.map(|verdict| verdict.as_str()).unwrap_or("pending"),
            "registered client"
        );
        Ok(stored)
    }

    /// Replace a client's profile and re-run the evaluation.
    pub fn update_client(
        &self,
        client_id: &ClientId,
        submission: ClientSubmission,
    ) -> Result<Client, PortfolioServiceError> {
        let existing = self.get_client(client_id)?;
        let submission = self.guard.client_submission(submission)?;
        let client = self.evaluated_client(existing.id, submission, existing.registered_on)?;

        self.clients.update(client.clone())?;
        tracing::info!(client_id = %client.id, score = client.credit_score, "updated client");
        Ok(client)
    }

    pub fn get_client(&self, client_id: &ClientId) -> Result<Client, PortfolioServiceError> {
        self.clients
            .fetch(client_id)?
            .ok_or_else(|| PortfolioServiceError::ClientNotFound(client_id.clone()))
    }

    /// Clients sorted by name, optionally narrowed to one current state.
    pub fn list_clients(
        &self,
        state: Option<PaymentState>,
    ) -> Result<Vec<ClientOverview>, PortfolioServiceError> {
        let mut clients = self.clients.list()?;
        clients.retain(|client| state.map_or(true, |state| client.current_state == state));
        clients.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut by_client: HashMap<ClientId, Vec<PaymentRecord>> = HashMap::new();
        for payment in self.payments.all()? {
            by_client
                .entry(payment.client_id.clone())
                .or_default()
                .push(payment);
        }

        Ok(clients
            .iter()
            .map(|client| {
                let payments = by_client
                    .get(&client.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                ClientOverview::from_client(client, payments)
            })
            .collect())
    }

    /// Delete a client and its whole ledger, returning how many payments went with it.
    pub fn remove_client(&self, client_id: &ClientId) -> Result<usize, PortfolioServiceError> {
        self.get_client(client_id)?;
        let removed = self.payments.remove_for_client(client_id)?;
        self.clients.remove(client_id)?;
        tracing::info!(client_id = %client_id, payments_removed = removed, "removed client");
        Ok(removed)
    }

    pub fn record_payment(
        &self,
        client_id: &ClientId,
        submission: PaymentSubmission,
    ) -> Result<PaymentRecord, PortfolioServiceError> {
        self.get_client(client_id)?;
        let submission = self.guard.payment_submission(submission)?;
        let record = payment_record(next_payment_id(), client_id.clone(), submission);

        let stored = self.payments.insert(record)?;
        tracing::info!(
            payment_id = %stored.id,
            client_id = %stored.client_id,
            period = %stored.period,
            state = %stored.state,
            "recorded payment"
        );
        Ok(stored)
    }

    /// Full edit of a ledger entry, including moving it to another client.
    pub fn revise_payment(
        &self,
        payment_id: &PaymentId,
        revision: PaymentRevision,
    ) -> Result<PaymentRecord, PortfolioServiceError> {
        let existing = self.get_payment(payment_id)?;
        self.get_client(&revision.client_id)?;
        let submission = self.guard.payment_submission(revision.payment)?;

        let mut record = payment_record(existing.id, revision.client_id, submission);
        record.recorded_at = existing.recorded_at;

        self.payments.update(record.clone())?;
        tracing::info!(payment_id = %record.id, client_id = %record.client_id, "revised payment");
        Ok(record)
    }

    /// Correct only the state of a ledger entry.
    pub fn set_payment_state(
        &self,
        payment_id: &PaymentId,
        state: PaymentState,
    ) -> Result<PaymentRecord, PortfolioServiceError> {
        let mut record = self.get_payment(payment_id)?;
        let previous = record.state;
        record.state = state;

        self.payments.update(record.clone())?;
        tracing::info!(
            payment_id = %record.id,
            from = %previous,
            to = %state,
            "corrected payment state"
        );
        Ok(record)
    }

    pub fn remove_payment(&self, payment_id: &PaymentId) -> Result<(), PortfolioServiceError> {
        self.get_payment(payment_id)?;
        self.payments.remove(payment_id)?;
        tracing::info!(payment_id = %payment_id, "removed payment");
        Ok(())
    }

    pub fn get_payment(&self, payment_id: &PaymentId) -> Result<PaymentRecord, PortfolioServiceError> {
        self.payments
            .fetch(payment_id)?
            .ok_or_else(|| PortfolioServiceError::PaymentNotFound(payment_id.clone()))
    }

    pub fn client_payments(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<PaymentRecord>, PortfolioServiceError> {
        self.get_client(client_id)?;
        let mut payments = self.payments.for_client(client_id)?;
        payments.sort_by(|a, b| b.period.cmp(&a.period));
        Ok(payments)
    }

    /// Evaluate figures that are not necessarily stored.
    pub fn assess(
        &self,
        request: &AssessmentRequest,
    ) -> Result<CreditEvaluation, PortfolioServiceError> {
        let standing = match &request.client_id {
            Some(client_id) => self
                .clients
                .fetch(client_id)?
                .map(|client| PaymentStanding::Known(client.current_state))
                .unwrap_or(PaymentStanding::Pending),
            None => PaymentStanding::Pending,
        };

        Ok(self.evaluator.evaluate(&request.snapshot(standing))?)
    }

    /// Project a client's next payment states from the latest one on record.
    pub fn forecast_client(
        &self,
        client_id: &ClientId,
        horizon: Option<usize>,
    ) -> Result<ClientForecast, PortfolioServiceError> {
        let horizon = checked_horizon(horizon.unwrap_or(self.forecast_horizon))?;
        let client = self.get_client(client_id)?;
        let own = self.payments.for_client(client_id)?;
        let current_state = latest_state(&own)
            .ok_or_else(|| PortfolioServiceError::NoPaymentHistory(client_id.clone()))?;

        let ledger = self.payments.all()?;
        let sequences = training_sequences(&ledger);
        let predictor = MarkovPredictor::train(&sequences);
        let forecast = predictor.predict(current_state, horizon);
        let evaluation = self
            .evaluator
            .evaluate(&client.snapshot_with(current_state.into()))?;

        tracing::debug!(
            client_id = %client.id,
            current = %current_state,
            horizon,
            "forecast client payments"
        );

        Ok(ClientForecast {
            client_id: client.id,
            name: client.name,
            current_state,
            current_risk: risk_of(current_state),
            horizon,
            forecast,
            matrix: *predictor.matrix(),
            row_sources: PaymentState::ordered()
                .into_iter()
                .map(|state| RowSourceEntry {
                    state,
                    source: predictor.row_source(state),
                })
                .collect(),
            transitions_observed: predictor.transitions_observed(),
            evaluation,
        })
    }

    pub fn dashboard(&self, period: BillingPeriod) -> Result<DashboardSummary, PortfolioServiceError> {
        let clients = self.clients.list()?;
        let payments = self.payments.all()?;
        Ok(report::dashboard(&clients, &payments, period))
    }

    pub fn statement(
        &self,
        client_id: &ClientId,
        as_of: NaiveDate,
    ) -> Result<ClientStatement, PortfolioServiceError> {
        let client = self.get_client(client_id)?;
        let payments = self.payments.for_client(client_id)?;
        Ok(report::statement(&client, &payments, as_of))
    }

    /// Write the ledger as CSV ordered by client name, then newest period first.
    pub fn export_ledger<W: Write>(&self, writer: W) -> Result<usize, PortfolioServiceError> {
        let names: HashMap<ClientId, String> = self
            .clients
            .list()?
            .into_iter()
            .map(|client| (client.id, client.name))
            .collect();

        let mut payments = self.payments.all()?;
        let name_of = |payment: &PaymentRecord| {
            names
                .get(&payment.client_id)
                .map(String::as_str)
                .unwrap_or_default()
        };
        payments.sort_by(|a, b| {
            name_of(a)
                .cmp(name_of(b))
                .then_with(|| b.period.cmp(&a.period))
        });

        let written = ledger_csv::write_ledger(
            writer,
            payments.iter().map(|payment| (name_of(payment), payment)),
        )
        .map_err(PortfolioServiceError::Export)?;
        tracing::info!(rows = written, "exported payment ledger");
        Ok(written)
    }

    /// Import ledger rows. Every row is validated before any is stored.
    pub fn import_ledger<R: Read>(&self, reader: R) -> Result<usize, PortfolioServiceError> {
        let entries = LedgerCsvImporter::from_reader(reader)?;
        let known: HashSet<ClientId> = self
            .clients
            .list()?
            .into_iter()
            .map(|client| client.id)
            .collect();

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if !known.contains(&entry.client_id) {
                return Err(LedgerImportError::InvalidRow {
                    line: entry.line,
                    reason: format!("unknown client '{}'", entry.client_id),
                }
                .into());
            }
            let submission = self.guard.payment_submission(entry.submission).map_err(|err| {
                LedgerImportError::InvalidRow {
                    line: entry.line,
                    reason: err.to_string(),
                }
            })?;
            records.push(payment_record(next_payment_id(), entry.client_id, submission));
        }

        let imported = records.len();
        for record in records {
            self.payments.insert(record)?;
        }
        tracing::info!(rows = imported, "imported payment ledger");
        Ok(imported)
    }

    fn evaluated_client(
        &self,
        id: ClientId,
        submission: ClientSubmission,
        registered_on: NaiveDate,
    ) -> Result<Client, PortfolioServiceError> {
        let mut client = Client {
            id,
            name: submission.name,
            contact: ContactDetails {
                email: submission.email,
                phone: submission.phone,
                address: submission.address,
            },
            salary: submission.salary,
            other_income: submission.other_income,
            housing_expense: submission.housing_expense,
            has_property: submission.has_property,
            property_value: submission.property_value,
            current_state: submission.current_state,
            requested_amount: submission.requested_amount,
            notes: submission.notes,
            registered_on,
            credit_score: 0.0,
            verdict: None,
            evaluated_at: None,
            evaluation_record: None,
        };

        let evaluation = self.evaluator.evaluate(&client.snapshot())?;
        client.credit_score = evaluation.score;
        client.verdict = Some(evaluation.verdict);
        client.evaluated_at = Some(Utc::now());
        client.evaluation_record = Some(serde_json::to_string(&evaluation)?);
        Ok(client)
    }
}

fn payment_record(
    id: PaymentId,
    client_id: ClientId,
    submission: PaymentSubmission,
) -> PaymentRecord {
    PaymentRecord {
        id,
        client_id,
        period: submission.period(),
        state: submission.state,
        amount: submission.amount,
        description: submission.description,
        recorded_at: Utc::now(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowSourceEntry {
    pub state: PaymentState,
    pub source: RowSource,
}

/// Forecast for one client together with the model it was produced from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientForecast {
    pub client_id: ClientId,
    pub name: String,
    pub current_state: PaymentState,
    pub current_risk: RiskAssessment,
    pub horizon: usize,
    pub forecast: Forecast,
    pub matrix: TransitionMatrix,
    pub row_sources: Vec<RowSourceEntry>,
    pub transitions_observed: u32,
    pub evaluation: CreditEvaluation,
}

/// Error raised by the portfolio service.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error("client {0} has no payment history to forecast from")]
    NoPaymentHistory(ClientId),
    #[error(transparent)]
    Horizon(#[from] HorizonOutOfRange),
    #[error(transparent)]
    Import(#[from] LedgerImportError),
    #[error("failed to write ledger export: {0}")]
    Export(#[source] csv::Error),
    #[error("failed to serialize evaluation: {0}")]
    Serialization(#[from] serde_json::Error),
}
