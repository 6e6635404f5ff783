use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::portfolio::domain::{ClientId, PaymentState, PaymentSubmission};

use super::{LedgerEntry, LedgerImportError};

pub(crate) fn parse_entries<R: Read>(reader: R) -> Result<Vec<LedgerEntry>, LedgerImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, record) in csv_reader.deserialize::<LedgerRow>().enumerate() {
        let line = index + 1;
        let row = record?;
        let state = row
            .state
            .parse::<PaymentState>()
            .map_err(|err| LedgerImportError::InvalidRow {
                line,
                reason: err.to_string(),
            })?;
        let client_id = row.client_id.trim().to_string();
        if client_id.is_empty() {
            return Err(LedgerImportError::InvalidRow {
                line,
                reason: "client_id is empty".to_string(),
            });
        }

        entries.push(LedgerEntry {
            line,
            client_id: ClientId(client_id),
            submission: PaymentSubmission {
                month: row.month,
                year: row.year,
                state,
                amount: row.amount,
                description: row.description,
            },
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    client_id: String,
    month: u32,
    year: i32,
    state: String,
    amount: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
