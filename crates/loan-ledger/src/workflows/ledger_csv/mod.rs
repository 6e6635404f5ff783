//! Plain CSV exchange for the payment ledger.
//!
//! Imports read `client_id,month,year,state,amount,description`; exports write the same
//! columns plus client name and state label, so an export can be read back as an import.

mod parser;

use serde::Serialize;
use std::cmp::Ordering;
use std::io::{Read, Write};
use std::path::Path;

use crate::workflows::portfolio::domain::{
    BillingPeriod, ClientId, PaymentRecord, PaymentState, PaymentSubmission,
};
use crate::workflows::portfolio::forecast::LedgerPoint;

#[derive(Debug)]
pub enum LedgerImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for LedgerImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerImportError::Io(err) => write!(f, "failed to read ledger file: {}", err),
            LedgerImportError::Csv(err) => write!(f, "invalid ledger CSV data: {}", err),
            LedgerImportError::InvalidRow { line, reason } => {
                write!(f, "ledger row {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for LedgerImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerImportError::Io(err) => Some(err),
            LedgerImportError::Csv(err) => Some(err),
            LedgerImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for LedgerImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LedgerImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One parsed ledger row with its 1-based data line.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub line: usize,
    pub client_id: ClientId,
    pub submission: PaymentSubmission,
}

impl LedgerPoint for LedgerEntry {
    fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    fn period(&self) -> BillingPeriod {
        self.submission.period()
    }

    fn state(&self) -> PaymentState {
        self.submission.state
    }

    fn tiebreak(&self, other: &Self) -> Ordering {
        self.line.cmp(&other.line)
    }
}

pub struct LedgerCsvImporter;

impl LedgerCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<LedgerEntry>, LedgerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<LedgerEntry>, LedgerImportError> {
        parser::parse_entries(reader)
    }
}

const EXPORT_HEADER: [&str; 8] = [
    "client_id",
    "client_name",
    "month",
    "year",
    "state",
    "state_label",
    "amount",
    "description",
];

#[derive(Debug, Serialize)]
struct LedgerExportRow<'a> {
    client_id: &'a str,
    client_name: &'a str,
    month: u32,
    year: i32,
    state: &'static str,
    state_label: &'static str,
    amount: f64,
    description: &'a str,
}

/// Write payments joined with client names, header first. Rows keep the order given.
pub fn write_ledger<'a, W, I>(writer: W, rows: I) -> Result<usize, csv::Error>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a PaymentRecord)>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;
    let mut written = 0;

    for (client_name, payment) in rows {
        csv_writer.serialize(LedgerExportRow {
            client_id: &payment.client_id.0,
            client_name,
            month: payment.period.month,
            year: payment.period.year,
            state: payment.state.as_str(),
            state_label: payment.state.label(),
            amount: payment.amount,
            description: payment.description.as_deref().unwrap_or_default(),
        })?;
        written += 1;
    }

    csv_writer.flush()?;
    Ok(written)
}
