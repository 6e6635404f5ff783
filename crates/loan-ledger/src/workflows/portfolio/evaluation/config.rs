use serde::{Deserialize, Serialize};

/// Factor weights in percentage points.
///
/// The four repayment factors sum to 100 and property is layered on top as a further
/// 10, so a perfect profile scores 110.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub income: u32,
    pub expense: u32,
    pub debt_ratio: u32,
    pub history: u32,
    pub property: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            income: 35,
            expense: 35,
            debt_ratio: 20,
            history: 10,
            property: 10,
        }
    }
}

/// Rubric configuration for the credit evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub weights: ScoreWeights,
    pub eligible_threshold: f64,
    pub conditional_threshold: f64,
    pub currency: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            eligible_threshold: 70.0,
            conditional_threshold: 50.0,
            currency: "Bs.".to_string(),
        }
    }
}

impl EvaluationConfig {
    pub fn with_currency(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            ..Self::default()
        }
    }
}
