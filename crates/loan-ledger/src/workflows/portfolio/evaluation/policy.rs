use super::config::EvaluationConfig;
use serde::{Deserialize, Serialize};

/// Lending verdict derived from the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Eligible,
    Conditional,
    Ineligible,
}

impl Verdict {
    pub const fn ordered() -> [Self; 3] {
        [Self::Eligible, Self::Conditional, Self::Ineligible]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Verdict::Eligible => "eligible",
            Verdict::Conditional => "conditional",
            Verdict::Ineligible => "ineligible",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Eligible => "Eligible",
            Verdict::Conditional => "Conditionally eligible",
            Verdict::Ineligible => "Not eligible",
        }
    }

    /// Risk level implied by the verdict.
    pub const fn risk(self) -> RiskLevel {
        match self {
            Verdict::Eligible => RiskLevel::Low,
            Verdict::Conditional => RiskLevel::Moderate,
            Verdict::Ineligible => RiskLevel::High,
        }
    }
}

/// Coarse risk grade shared by credit verdicts and payment forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
            RiskLevel::Unknown => "Unknown",
        }
    }

    /// Presentation tag consumed by dashboards.
    pub const fn tag(self) -> &'static str {
        match self {
            RiskLevel::Low => "success",
            RiskLevel::Moderate => "warning",
            RiskLevel::High => "orange",
            RiskLevel::VeryHigh => "danger",
            RiskLevel::Unknown => "secondary",
        }
    }
}

pub(crate) fn decide_verdict(score: f64, config: &EvaluationConfig) -> Verdict {
    if score >= config.eligible_threshold {
        Verdict::Eligible
    } else if score >= config.conditional_threshold {
        Verdict::Conditional
    } else {
        Verdict::Ineligible
    }
}
