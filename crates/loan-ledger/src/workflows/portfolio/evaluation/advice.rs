use super::super::domain::{PaymentStanding, PaymentState};
use super::config::EvaluationConfig;
use super::rules::{
    ExpenseBand, FactorBands, IncomeBand, PropertyBand, RatioBand, EXPENSE_CONTROLLED,
    EXPENSE_HIGH, EXPENSE_LOW, EXPENSE_MODERATE, INCOME_LOW, INCOME_MODERATE, INCOME_STRONG,
    INCOME_VERY_LOW, RATIO_ADEQUATE,
};

/// How a recommendation reads against the client's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdviceTone {
    Summary,
    Strength,
    Caution,
    Concern,
    Improvement,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Advice {
    pub tone: AdviceTone,
    pub message: String,
}

impl Advice {
    fn new(tone: AdviceTone, message: String) -> Self {
        Self { tone, message }
    }
}

/// Build the ordered recommendation list: summary banner, then observations per factor
/// (strengths and cautions before concerns), then improvement actions.
pub(crate) fn recommend(bands: &FactorBands, score: f64, config: &EvaluationConfig) -> Vec<Advice> {
    let currency = config.currency.as_str();
    let mut observations = Vec::new();
    let mut concerns = Vec::new();
    let mut improvements = Vec::new();

    for advice in [
        Some(income_advice(bands.income, currency)),
        Some(expense_advice(bands.expense, currency)),
        Some(ratio_advice(bands.ratio, bands.debt_ratio)),
        history_advice(bands.history),
    ]
    .into_iter()
    .flatten()
    {
        match advice.tone {
            AdviceTone::Concern => concerns.push(advice),
            _ => observations.push(advice),
        }
    }

    let property = property_advice(bands.property, bands.property_value, currency);
    match property.tone {
        AdviceTone::Improvement => improvements.push(property),
        _ => observations.push(property),
    }

    if matches!(
        bands.income,
        IncomeBand::None | IncomeBand::VeryLow | IncomeBand::Low | IncomeBand::Moderate
    ) {
        improvements.push(Advice::new(
            AdviceTone::Improvement,
            "Increase income: an additional income source would strengthen repayment capacity."
                .to_string(),
        ));
    }

    if matches!(bands.expense, ExpenseBand::High | ExpenseBand::VeryHigh) {
        improvements.push(Advice::new(
            AdviceTone::Improvement,
            "Reduce housing expense: a lower monthly expense widens the available margin."
                .to_string(),
        ));
    }

    if bands.debt_ratio > RATIO_ADEQUATE {
        improvements.push(Advice::new(
            AdviceTone::Improvement,
            format!(
                "Improve the debt ratio: cut expenses or raise income to get below {:.0}%.",
                RATIO_ADEQUATE * 100.0
            ),
        ));
    }

    let summary = summary_advice(!concerns.is_empty(), score, config);

    let mut advice = Vec::with_capacity(1 + observations.len() + concerns.len() + improvements.len());
    advice.push(summary);
    advice.extend(observations);
    advice.extend(concerns);
    advice.extend(improvements);
    advice
}

fn summary_advice(has_concerns: bool, score: f64, config: &EvaluationConfig) -> Advice {
    let message = if !has_concerns && score >= config.eligible_threshold {
        "ELIGIBLE: the client meets every requirement for financing."
    } else if has_concerns && score < config.conditional_threshold {
        "NOT ELIGIBLE: the client does not meet the minimum requirements at this time."
    } else {
        "CONDITIONALLY ELIGIBLE: financing is possible with limitations."
    };
    Advice::new(AdviceTone::Summary, message.to_string())
}

fn income_advice(band: IncomeBand, currency: &str) -> Advice {
    match band {
        IncomeBand::Strong => Advice::new(
            AdviceTone::Strength,
            format!("Strong income (>= {INCOME_STRONG:.0} {currency}): solid repayment capacity."),
        ),
        IncomeBand::Good => Advice::new(
            AdviceTone::Strength,
            format!(
                "Good income (>= {INCOME_MODERATE:.0} {currency}): adequate repayment capacity."
            ),
        ),
        IncomeBand::Moderate => Advice::new(
            AdviceTone::Caution,
            format!(
                "Moderate income (>= {INCOME_LOW:.0} {currency}): repayment capacity exists but is limited."
            ),
        ),
        IncomeBand::Low => Advice::new(
            AdviceTone::Concern,
            format!("Low income (< {INCOME_LOW:.0} {currency}): risk of being unable to repay."),
        ),
        IncomeBand::VeryLow | IncomeBand::None => Advice::new(
            AdviceTone::Concern,
            format!(
                "Insufficient income (< {INCOME_VERY_LOW:.0} {currency}): no proven repayment capacity."
            ),
        ),
    }
}

fn expense_advice(band: ExpenseBand, currency: &str) -> Advice {
    match band {
        ExpenseBand::None => Advice::new(
            AdviceTone::Strength,
            "No housing expense: the full margin is available for new obligations.".to_string(),
        ),
        ExpenseBand::Low => Advice::new(
            AdviceTone::Strength,
            format!(
                "Low housing expense (< {EXPENSE_LOW:.0} {currency}): ample margin for new obligations."
            ),
        ),
        ExpenseBand::Controlled => Advice::new(
            AdviceTone::Strength,
            format!(
                "Controlled housing expense (< {EXPENSE_CONTROLLED:.0} {currency}): good margin to take on a loan."
            ),
        ),
        ExpenseBand::Moderate => Advice::new(
            AdviceTone::Caution,
            format!(
                "Moderate housing expense (< {EXPENSE_MODERATE:.0} {currency}): acceptable margin."
            ),
        ),
        ExpenseBand::High => Advice::new(
            AdviceTone::Concern,
            format!(
                "High housing expense (>= {EXPENSE_MODERATE:.0} {currency}): little margin for new obligations."
            ),
        ),
        ExpenseBand::VeryHigh => Advice::new(
            AdviceTone::Concern,
            format!(
                "Very high housing expense (>= {EXPENSE_HIGH:.0} {currency}): no margin left for a loan."
            ),
        ),
    }
}

fn ratio_advice(band: RatioBand, ratio: f64) -> Advice {
    let pct = ratio * 100.0;
    match band {
        RatioBand::Excellent => Advice::new(
            AdviceTone::Strength,
            format!("Excellent debt ratio ({pct:.1}%): can comfortably take on a loan."),
        ),
        RatioBand::Adequate => Advice::new(
            AdviceTone::Strength,
            format!("Adequate debt ratio ({pct:.1}%): repayment capacity confirmed."),
        ),
        RatioBand::Moderate => Advice::new(
            AdviceTone::Caution,
            format!("Moderate debt ratio ({pct:.1}%): lending is possible with caution."),
        ),
        RatioBand::High => Advice::new(
            AdviceTone::Concern,
            format!("High debt ratio ({pct:.1}%): very little margin for new obligations."),
        ),
        RatioBand::Critical => Advice::new(
            AdviceTone::Concern,
            format!("Critical debt ratio ({pct:.1}%): no capacity to take on more debt."),
        ),
    }
}

fn history_advice(standing: PaymentStanding) -> Option<Advice> {
    let state = match standing {
        PaymentStanding::Known(state) => state,
        PaymentStanding::Pending => return None,
    };

    let advice = match state {
        PaymentState::OnTime => Advice::new(
            AdviceTone::Strength,
            "Clean payment history: the client is current on all obligations.".to_string(),
        ),
        PaymentState::MildDelay => Advice::new(
            AdviceTone::Caution,
            "Payment history shows mild delays: capacity exists with some inconsistency."
                .to_string(),
        ),
        PaymentState::SevereDelay => Advice::new(
            AdviceTone::Concern,
            "Problematic payment history: severe delays point to habitual non-compliance."
                .to_string(),
        ),
        PaymentState::Defaulted => Advice::new(
            AdviceTone::Concern,
            "Critical payment history: unpaid debts show a lack of capacity or willingness to pay."
                .to_string(),
        ),
    };
    Some(advice)
}

fn property_advice(band: PropertyBand, value: f64, currency: &str) -> Advice {
    match band {
        PropertyBand::Valuable => Advice::new(
            AdviceTone::Strength,
            format!("Valuable property ({currency} {value:.2}): solid collateral for the loan."),
        ),
        PropertyBand::Registered => Advice::new(
            AdviceTone::Strength,
            format!("Registered property ({currency} {value:.2}): reduces the risk of the loan."),
        ),
        PropertyBand::Modest => Advice::new(
            AdviceTone::Caution,
            format!("Registered property ({currency} {value:.2}): helps, though its value is limited."),
        ),
        PropertyBand::None => Advice::new(
            AdviceTone::Improvement,
            "No property on record: acquiring one would significantly strengthen the credit profile."
                .to_string(),
        ),
    }
}
