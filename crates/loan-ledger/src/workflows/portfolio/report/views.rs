use super::super::domain::{BillingPeriod, ClientId, PaymentId, PaymentState};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountTally {
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCountEntry {
    pub state: PaymentState,
    pub state_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskClientView {
    pub client_id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub current_state: PaymentState,
    pub total_payments: usize,
    pub defaulted_payments: usize,
    pub defaulted_debt: f64,
}

/// Why a rejected client should not be lent to again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    PermanentDefault,
    VeryHighRisk,
    ChronicLatePayer,
    Uncollectible,
}

impl RejectionReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PermanentDefault => "Permanent default",
            Self::VeryHighRisk => "Very high risk",
            Self::ChronicLatePayer => "Chronic late payer",
            Self::Uncollectible => "Uncollectible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedClientView {
    pub client_id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_state: PaymentState,
    pub credit_score: f64,
    pub defaulted_debt: f64,
    pub reason: RejectionReason,
    pub reason_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub clients_at_risk: usize,
    pub delinquent_payments: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub period: BillingPeriod,
    pub period_label: String,
    pub active_clients: usize,
    pub rejected_clients: usize,
    pub state_distribution: Vec<StateCountEntry>,
    pub collected_on_time: AmountTally,
    pub late_payments: AmountTally,
    pub defaulted_payments: AmountTally,
    pub delinquent_amount: f64,
    pub total_amount: f64,
    pub clients_at_risk: Vec<AtRiskClientView>,
    pub rejected: Vec<RejectedClientView>,
    pub alerts: AlertCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementEntryView {
    pub payment_id: PaymentId,
    pub period: BillingPeriod,
    pub period_label: String,
    pub state: PaymentState,
    pub state_label: &'static str,
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementYearView {
    pub year: i32,
    pub payments: Vec<StatementEntryView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatementTotals {
    pub payments: usize,
    pub on_time: usize,
    pub late: usize,
    pub defaulted: usize,
    pub total_amount: f64,
    pub defaulted_debt: f64,
    pub average_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextDueView {
    pub period: BillingPeriod,
    pub period_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatement {
    pub client_id: ClientId,
    pub name: String,
    pub current_state: PaymentState,
    pub years: Vec<StatementYearView>,
    pub totals: StatementTotals,
    pub payments_made: usize,
    pub payments_remaining: usize,
    /// Defaulted amounts already due on the reference date.
    pub debt_as_of: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_period: Option<BillingPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<NextDueView>,
}
