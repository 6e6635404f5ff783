use serde::{Deserialize, Serialize};

use super::super::domain::{FinancialSnapshot, PaymentStanding, PaymentState};
use super::config::ScoreWeights;

pub(crate) const INCOME_VERY_LOW: f64 = 1000.0;
pub(crate) const INCOME_LOW: f64 = 2000.0;
pub(crate) const INCOME_MODERATE: f64 = 3000.0;
pub(crate) const INCOME_STRONG: f64 = 5000.0;

pub(crate) const EXPENSE_LOW: f64 = 300.0;
pub(crate) const EXPENSE_CONTROLLED: f64 = 600.0;
pub(crate) const EXPENSE_MODERATE: f64 = 1000.0;
pub(crate) const EXPENSE_HIGH: f64 = 1500.0;

pub(crate) const RATIO_EXCELLENT: f64 = 0.25;
pub(crate) const RATIO_ADEQUATE: f64 = 0.40;
pub(crate) const RATIO_MODERATE: f64 = 0.60;
pub(crate) const RATIO_HIGH: f64 = 0.80;

pub(crate) const PROPERTY_VALUABLE: f64 = 50_000.0;
pub(crate) const PROPERTY_REGISTERED: f64 = 20_000.0;

/// Total income band. Boundary values belong to the upper band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBand {
    None,
    VeryLow,
    Low,
    Moderate,
    Good,
    Strong,
}

impl IncomeBand {
    pub fn classify(total_income: f64) -> Self {
        if total_income <= 0.0 {
            Self::None
        } else if total_income < INCOME_VERY_LOW {
            Self::VeryLow
        } else if total_income < INCOME_LOW {
            Self::Low
        } else if total_income < INCOME_MODERATE {
            Self::Moderate
        } else if total_income < INCOME_STRONG {
            Self::Good
        } else {
            Self::Strong
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::None => 0,
            Self::VeryLow => 20,
            Self::Low => 40,
            Self::Moderate => 60,
            Self::Good => 80,
            Self::Strong => 100,
        }
    }
}

/// Housing expense band; lower expense scores higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseBand {
    None,
    Low,
    Controlled,
    Moderate,
    High,
    VeryHigh,
}

impl ExpenseBand {
    pub fn classify(housing_expense: f64) -> Self {
        if housing_expense <= 0.0 {
            Self::None
        } else if housing_expense < EXPENSE_LOW {
            Self::Low
        } else if housing_expense < EXPENSE_CONTROLLED {
            Self::Controlled
        } else if housing_expense < EXPENSE_MODERATE {
            Self::Moderate
        } else if housing_expense < EXPENSE_HIGH {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::None => 100,
            Self::Low => 90,
            Self::Controlled => 75,
            Self::Moderate => 50,
            Self::High => 30,
            Self::VeryHigh => 10,
        }
    }
}

/// Debt ratio band. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioBand {
    Excellent,
    Adequate,
    Moderate,
    High,
    Critical,
}

impl RatioBand {
    pub fn classify(ratio: f64) -> Self {
        if ratio <= RATIO_EXCELLENT {
            Self::Excellent
        } else if ratio <= RATIO_ADEQUATE {
            Self::Adequate
        } else if ratio <= RATIO_MODERATE {
            Self::Moderate
        } else if ratio <= RATIO_HIGH {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::Excellent => 100,
            Self::Adequate => 80,
            Self::Moderate => 60,
            Self::High => 40,
            Self::Critical => 20,
        }
    }
}

/// Collateral band; only `None` is penalized in the score, the others shape advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyBand {
    None,
    Modest,
    Registered,
    Valuable,
}

impl PropertyBand {
    pub fn classify(has_property: bool, property_value: f64) -> Self {
        if !has_property || property_value <= 0.0 {
            Self::None
        } else if property_value >= PROPERTY_VALUABLE {
            Self::Valuable
        } else if property_value >= PROPERTY_REGISTERED {
            Self::Registered
        } else {
            Self::Modest
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::None => 30,
            Self::Modest | Self::Registered | Self::Valuable => 100,
        }
    }
}

pub const fn history_score(standing: PaymentStanding) -> u8 {
    match standing {
        PaymentStanding::Known(PaymentState::OnTime) => 100,
        PaymentStanding::Known(PaymentState::MildDelay) => 60,
        PaymentStanding::Known(PaymentState::SevereDelay) => 30,
        PaymentStanding::Known(PaymentState::Defaulted) => 0,
        PaymentStanding::Pending => 50,
    }
}

/// Housing expense over total income, capped at 1.0; 1.0 when there is no income.
pub fn debt_ratio(total_income: f64, total_expense: f64) -> f64 {
    if total_income <= 0.0 {
        return 1.0;
    }
    (total_expense / total_income).min(1.0)
}

/// Band each factor of a snapshot fell into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FactorBands {
    pub income: IncomeBand,
    pub expense: ExpenseBand,
    pub ratio: RatioBand,
    pub debt_ratio: f64,
    pub history: PaymentStanding,
    pub property: PropertyBand,
    pub property_value: f64,
}

impl FactorBands {
    pub(crate) fn classify(snapshot: &FinancialSnapshot) -> Self {
        let total_income = snapshot.total_income();
        let ratio = debt_ratio(total_income, snapshot.housing_expense);
        let property_value = snapshot.effective_property_value();

        Self {
            income: IncomeBand::classify(total_income),
            expense: ExpenseBand::classify(snapshot.housing_expense),
            ratio: RatioBand::classify(ratio),
            debt_ratio: ratio,
            history: snapshot.current_state,
            property: PropertyBand::classify(snapshot.has_property, property_value),
            property_value,
        }
    }

    pub(crate) fn breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            income: self.income.score(),
            expense: self.expense.score(),
            debt_ratio: self.ratio.score(),
            history: history_score(self.history),
            property: self.property.score(),
        }
    }
}

/// Per-factor sub-scores on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub income: u8,
    pub expense: u8,
    pub debt_ratio: u8,
    pub history: u8,
    pub property: u8,
}

impl ScoreBreakdown {
    /// Weighted sum in hundredths of a point, kept integral so thresholds compare exactly.
    pub fn weighted_hundredths(&self, weights: &ScoreWeights) -> u32 {
        u32::from(self.income) * weights.income
            + u32::from(self.expense) * weights.expense
            + u32::from(self.debt_ratio) * weights.debt_ratio
            + u32::from(self.history) * weights.history
            + u32::from(self.property) * weights.property
    }

    pub fn weighted_score(&self, weights: &ScoreWeights) -> f64 {
        f64::from(self.weighted_hundredths(weights)) / 100.0
    }
}
