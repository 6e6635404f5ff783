use serde::Serialize;

use super::domain::{Client, ClientId, PaymentId, PaymentRecord, PaymentState};
use super::evaluation::Verdict;

/// Client storage so the service can be exercised without a database.
pub trait ClientRepository: Send + Sync {
    fn insert(&self, client: Client) -> Result<Client, RepositoryError>;
    fn update(&self, client: Client) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError>;
    fn list(&self) -> Result<Vec<Client>, RepositoryError>;
    fn remove(&self, id: &ClientId) -> Result<(), RepositoryError>;
}

/// Ledger storage for monthly payment records.
pub trait PaymentRepository: Send + Sync {
    fn insert(&self, record: PaymentRecord) -> Result<PaymentRecord, RepositoryError>;
    fn update(&self, record: PaymentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, RepositoryError>;
    fn for_client(&self, client_id: &ClientId) -> Result<Vec<PaymentRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<PaymentRecord>, RepositoryError>;
    fn remove(&self, id: &PaymentId) -> Result<(), RepositoryError>;
    /// Delete every record of a client, returning how many were removed.
    fn remove_for_client(&self, client_id: &ClientId) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Client row shown in listings, with ledger counts attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientOverview {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_state: PaymentState,
    pub credit_score: f64,
    pub verdict: Option<Verdict>,
    pub total_payments: usize,
    pub defaulted_payments: usize,
}

impl ClientOverview {
    pub fn from_client(client: &Client, payments: &[PaymentRecord]) -> Self {
        Self {
            id: client.id.clone(),
            name: client.name.clone(),
            email: client.contact.email.clone(),
            phone: client.contact.phone.clone(),
            current_state: client.current_state,
            credit_score: client.credit_score,
            verdict: client.verdict,
            total_payments: payments.len(),
            defaulted_payments: payments
                .iter()
                .filter(|payment| payment.state == PaymentState::Defaulted)
                .count(),
        }
    }
}
