//! Client portfolio: intake, credit evaluation, payment ledger, forecasting and reports.

pub mod domain;
pub mod evaluation;
pub mod forecast;
pub(crate) mod intake;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AssessmentRequest, BillingPeriod, Client, ClientId, ClientSubmission, ContactDetails,
    FinancialSnapshot, InvalidAmount, PaymentId, PaymentRecord, PaymentRevision, PaymentStanding, PaymentState,
    PaymentSubmission, UnknownPaymentState,
};
pub use evaluation::{
    CreditEvaluation, CreditEvaluator, EvaluationConfig, EvaluationError, RiskLevel,
    ScoreBreakdown, ScoreWeights, Verdict,
};
pub use forecast::{
    Forecast, HorizonOutOfRange, MarkovPredictor, RiskAssessment, RowSource, TransitionMatrix,
    MAX_FORECAST_HORIZON,
};
pub use intake::IntakeViolation;
pub use report::{ClientStatement, DashboardSummary};
pub use repository::{ClientOverview, ClientRepository, PaymentRepository, RepositoryError};
pub use router::portfolio_router;
pub use service::{ClientForecast, LoanPortfolioService, PortfolioServiceError};

/// Round to two decimals, the precision every reported figure uses.
pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
