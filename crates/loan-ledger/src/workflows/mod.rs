pub mod ledger_csv;
pub mod portfolio;
