//! Loan back office core.
//!
//! The [`workflows::portfolio`] module owns the client and payment ledger, the credit
//! evaluator, and the Markov payment forecaster. [`workflows::ledger_csv`] moves ledger
//! rows in and out of plain CSV.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
