use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::Verdict;

/// Identifier wrapper for registered clients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Identifier wrapper for ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standing of a single billing period. Variants are declared in severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentState {
    #[serde(rename = "on_time")]
    OnTime,
    #[serde(rename = "mild_delay")]
    MildDelay,
    #[serde(rename = "severe_delay")]
    SevereDelay,
    #[serde(rename = "default")]
    Defaulted,
}

impl PaymentState {
    /// Fixed enumeration order; transition tie-breaks follow it.
    pub const fn ordered() -> [Self; 4] {
        [
            Self::OnTime,
            Self::MildDelay,
            Self::SevereDelay,
            Self::Defaulted,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::OnTime => 0,
            Self::MildDelay => 1,
            Self::SevereDelay => 2,
            Self::Defaulted => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTime => "on_time",
            Self::MildDelay => "mild_delay",
            Self::SevereDelay => "severe_delay",
            Self::Defaulted => "default",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OnTime => "On time",
            Self::MildDelay => "Mild delay",
            Self::SevereDelay => "Severe delay",
            Self::Defaulted => "Default",
        }
    }

    /// Late but eventually paid.
    pub const fn is_late(self) -> bool {
        matches!(self, Self::MildDelay | Self::SevereDelay)
    }

    pub const fn is_delinquent(self) -> bool {
        !matches!(self, Self::OnTime)
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized payment state '{0}'")]
pub struct UnknownPaymentState(pub String);

impl FromStr for PaymentState {
    type Err = UnknownPaymentState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ordered()
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| UnknownPaymentState(value.to_string()))
    }
}

/// Payment standing fed to the evaluator: a known state, or `pending` for clients
/// without any history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentStanding {
    Pending,
    Known(PaymentState),
}

impl PaymentStanding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Known(state) => state.as_str(),
        }
    }
}

impl From<PaymentState> for PaymentStanding {
    fn from(state: PaymentState) -> Self {
        Self::Known(state)
    }
}

impl From<PaymentStanding> for String {
    fn from(standing: PaymentStanding) -> Self {
        standing.as_str().to_string()
    }
}

impl TryFrom<String> for PaymentStanding {
    type Error = UnknownPaymentState;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for PaymentStanding {
    type Err = UnknownPaymentState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("pending") {
            return Ok(Self::Pending);
        }
        value.parse::<PaymentState>().map(Self::Known)
    }
}

impl fmt::Display for PaymentStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Month/year a payment is due for. Field order makes the derived ordering
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Mid-month reference date, the day statements treat a period as due.
    pub fn due_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 15)
    }

    pub fn short_label(self) -> String {
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        match MONTHS.get(self.month.saturating_sub(1) as usize) {
            Some(name) => format!("{name}/{}", self.year),
            None => format!("{:02}/{}", self.month, self.year),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (year, month) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, found '{value}'"))?;
        let year = year
            .parse::<i32>()
            .map_err(|err| format!("invalid year in '{value}' ({err})"))?;
        let month = month
            .parse::<u32>()
            .map_err(|err| format!("invalid month in '{value}' ({err})"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 1 and 12, found {month}"));
        }
        Ok(Self::new(year, month))
    }
}

/// Financial snapshot the evaluator scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub salary: f64,
    pub other_income: f64,
    pub housing_expense: f64,
    pub has_property: bool,
    pub property_value: f64,
    pub current_state: PaymentStanding,
}

impl FinancialSnapshot {
    pub fn total_income(&self) -> f64 {
        self.salary + self.other_income
    }

    /// Property value counted toward the evaluation; zero without a property.
    pub fn effective_property_value(&self) -> f64 {
        if self.has_property {
            self.property_value
        } else {
            0.0
        }
    }
}

/// Monetary input that cannot be scored or stored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidAmount {
    #[error("{field} must not be negative (found {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite amount")]
    NonFinite { field: &'static str },
}

/// Amounts must be finite and non-negative.
pub fn check_amount(field: &'static str, value: f64) -> Result<(), InvalidAmount> {
    if !value.is_finite() {
        return Err(InvalidAmount::NonFinite { field });
    }
    if value < 0.0 {
        return Err(InvalidAmount::Negative { field, value });
    }
    Ok(())
}

/// Inbound registration or edit payload for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSubmission {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_current_state")]
    pub current_state: PaymentState,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub other_income: f64,
    #[serde(default)]
    pub housing_expense: f64,
    #[serde(default)]
    pub has_property: bool,
    #[serde(default)]
    pub property_value: f64,
    #[serde(default)]
    pub requested_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_current_state() -> PaymentState {
    PaymentState::OnTime
}

/// Contact details kept alongside the financial profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Registered borrower with its last evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub contact: ContactDetails,
    pub salary: f64,
    pub other_income: f64,
    pub housing_expense: f64,
    pub has_property: bool,
    pub property_value: f64,
    pub current_state: PaymentState,
    pub requested_amount: f64,
    pub notes: Option<String>,
    pub registered_on: NaiveDate,
    pub credit_score: f64,
    pub verdict: Option<Verdict>,
    pub evaluated_at: Option<DateTime<Utc>>,
    /// Serialized evaluation kept for audit.
    pub evaluation_record: Option<String>,
}

impl Client {
    pub fn snapshot(&self) -> FinancialSnapshot {
        self.snapshot_with(self.current_state.into())
    }

    pub fn snapshot_with(&self, current_state: PaymentStanding) -> FinancialSnapshot {
        FinancialSnapshot {
            salary: self.salary,
            other_income: self.other_income,
            housing_expense: self.housing_expense,
            has_property: self.has_property,
            property_value: self.property_value,
            current_state,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.verdict == Some(Verdict::Ineligible)
    }
}

/// Inbound payload for a ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub month: u32,
    pub year: i32,
    pub state: PaymentState,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl PaymentSubmission {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.year, self.month)
    }
}

/// Full edit of a ledger entry; may move the entry to another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRevision {
    pub client_id: ClientId,
    #[serde(flatten)]
    pub payment: PaymentSubmission,
}

/// Ad-hoc evaluation request. When `client_id` names a stored client its current state
/// feeds the history factor; otherwise the history is treated as pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub salary: f64,
    #[serde(default)]
    pub other_income: f64,
    pub housing_expense: f64,
    #[serde(default)]
    pub has_property: bool,
    #[serde(default)]
    pub property_value: f64,
}

impl AssessmentRequest {
    pub fn snapshot(&self, current_state: PaymentStanding) -> FinancialSnapshot {
        let snapshot = FinancialSnapshot {
            salary: self.salary,
            other_income: self.other_income,
            housing_expense: self.housing_expense,
            has_property: self.has_property,
            property_value: self.property_value,
            current_state,
        };
        FinancialSnapshot {
            property_value: snapshot.effective_property_value(),
            ..snapshot
        }
    }
}

/// One billing cycle of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub client_id: ClientId,
    pub period: BillingPeriod,
    pub state: PaymentState,
    pub amount: f64,
    pub description: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_state_parses_labels_and_variants() {
        assert_eq!("on_time".parse::<PaymentState>(), Ok(PaymentState::OnTime));
        assert_eq!("Mild Delay".parse::<PaymentState>(), Ok(PaymentState::MildDelay));
        assert_eq!("severe-delay".parse::<PaymentState>(), Ok(PaymentState::SevereDelay));
        assert_eq!("default".parse::<PaymentState>(), Ok(PaymentState::Defaulted));
        assert!("late".parse::<PaymentState>().is_err());
    }

    #[test]
    fn payment_state_serializes_to_snake_case_labels() {
        let json = serde_json::to_string(&PaymentState::ordered()).expect("serialize");
        assert_eq!(json, r#"["on_time","mild_delay","severe_delay","default"]"#);
    }

    #[test]
    fn standing_round_trips_pending_through_strings() {
        let pending: PaymentStanding = serde_json::from_str("\"pending\"").expect("pending");
        assert_eq!(pending, PaymentStanding::Pending);
        let known: PaymentStanding = serde_json::from_str("\"severe_delay\"").expect("known");
        assert_eq!(known, PaymentStanding::Known(PaymentState::SevereDelay));
        assert!(serde_json::from_str::<PaymentStanding>("\"unknown\"").is_err());
    }

    #[test]
    fn billing_period_orders_by_year_then_month() {
        let mut periods = vec![
            BillingPeriod::new(2025, 1),
            BillingPeriod::new(2024, 12),
            BillingPeriod::new(2024, 2),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                BillingPeriod::new(2024, 2),
                BillingPeriod::new(2024, 12),
                BillingPeriod::new(2025, 1),
            ]
        );
    }

    #[test]
    fn billing_period_rolls_over_december() {
        assert_eq!(BillingPeriod::new(2024, 12).next(), BillingPeriod::new(2025, 1));
        assert_eq!(BillingPeriod::new(2024, 3).next(), BillingPeriod::new(2024, 4));
        assert_eq!(BillingPeriod::new(2024, 12).short_label(), "Dec/2024");
    }

    #[test]
    fn billing_period_parses_year_month() {
        assert_eq!("2025-11".parse::<BillingPeriod>(), Ok(BillingPeriod::new(2025, 11)));
        assert!("2025-13".parse::<BillingPeriod>().is_err());
        assert!("202511".parse::<BillingPeriod>().is_err());
    }
}
