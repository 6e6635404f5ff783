mod advice;
mod config;
mod policy;
mod rules;

pub use config::{EvaluationConfig, ScoreWeights};
pub use policy::{RiskLevel, Verdict};
pub use rules::{
    debt_ratio, history_score, ExpenseBand, IncomeBand, PropertyBand, RatioBand, ScoreBreakdown,
};

#[cfg(test)]
pub(crate) use advice::{recommend, AdviceTone};
#[cfg(test)]
pub(crate) use rules::FactorBands;

use super::domain::{check_amount, FinancialSnapshot, InvalidAmount, PaymentStanding};
use super::round_to_cents;
use policy::decide_verdict;
use serde::{Deserialize, Serialize};

/// Stateless evaluator that applies the credit rubric to a financial snapshot.
#[derive(Debug, Clone, Default)]
pub struct CreditEvaluator {
    config: EvaluationConfig,
}

impl CreditEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn evaluate(&self, snapshot: &FinancialSnapshot) -> Result<CreditEvaluation, EvaluationError> {
        check_amount("salary", snapshot.salary)?;
        check_amount("other_income", snapshot.other_income)?;
        check_amount("housing_expense", snapshot.housing_expense)?;
        check_amount("property_value", snapshot.property_value)?;

        let bands = rules::FactorBands::classify(snapshot);
        let breakdown = bands.breakdown();
        let score = breakdown.weighted_score(&self.config.weights);
        let verdict = decide_verdict(score, &self.config);
        let recommendations = advice::recommend(&bands, score, &self.config)
            .into_iter()
            .map(|advice| advice.message)
            .collect();

        let monthly_income = snapshot.total_income();
        let monthly_expense = snapshot.housing_expense;

        Ok(CreditEvaluation {
            score: round_to_cents(score),
            verdict,
            risk: verdict.risk(),
            breakdown,
            monthly_income,
            monthly_expense,
            debt_ratio_pct: round_to_cents(bands.debt_ratio * 100.0),
            available_margin: monthly_income - monthly_expense,
            has_property: snapshot.has_property,
            property_value: bands.property_value,
            current_state: snapshot.current_state,
            recommendations,
        })
    }
}

/// Evaluation output with the per-factor trail used for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEvaluation {
    pub score: f64,
    pub verdict: Verdict,
    pub risk: RiskLevel,
    pub breakdown: ScoreBreakdown,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub debt_ratio_pct: f64,
    pub available_margin: f64,
    pub has_property: bool,
    pub property_value: f64,
    pub current_state: PaymentStanding,
    pub recommendations: Vec<String>,
}

impl CreditEvaluation {
    pub fn summary(&self) -> String {
        format!(
            "{} ({:.2} points, {} risk)",
            self.verdict.label(),
            self.score,
            self.risk.label()
        )
    }
}

/// Inputs the evaluator refuses to score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Amount(#[from] InvalidAmount),
}
