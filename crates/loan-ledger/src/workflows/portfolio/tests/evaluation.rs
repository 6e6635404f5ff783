use super::common::{evaluator, snapshot};
use crate::workflows::portfolio::domain::{
    AssessmentRequest, FinancialSnapshot, InvalidAmount, PaymentStanding, PaymentState,
};
use crate::workflows::portfolio::evaluation::{
    debt_ratio, recommend, AdviceTone, EvaluationConfig, EvaluationError, ExpenseBand,
    FactorBands, IncomeBand, PropertyBand, RatioBand, RiskLevel, ScoreBreakdown, Verdict,
};

fn on_time() -> PaymentStanding {
    PaymentStanding::Known(PaymentState::OnTime)
}

#[test]
fn scores_a_good_income_profile_as_eligible() {
    let evaluation = evaluator()
        .evaluate(&snapshot(3500.0, 500.0, 800.0, on_time()))
        .expect("evaluation");

    assert_eq!(
        evaluation.breakdown,
        ScoreBreakdown {
            income: 80,
            expense: 50,
            debt_ratio: 100,
            history: 100,
            property: 30,
        }
    );
    assert_eq!(evaluation.score, 78.5);
    assert_eq!(evaluation.verdict, Verdict::Eligible);
    assert_eq!(evaluation.risk, RiskLevel::Low);
    assert_eq!(evaluation.monthly_income, 4000.0);
    assert_eq!(evaluation.available_margin, 3200.0);
    assert_eq!(evaluation.debt_ratio_pct, 20.0);
    assert_eq!(evaluation.summary(), "Eligible (78.50 points, Low risk)");
}

#[test]
fn mild_delay_with_moderate_income_is_conditional() {
    let evaluation = evaluator()
        .evaluate(&snapshot(
            2000.0,
            300.0,
            600.0,
            PaymentStanding::Known(PaymentState::MildDelay),
        ))
        .expect("evaluation");

    assert_eq!(evaluation.breakdown.income, 60);
    assert_eq!(evaluation.breakdown.expense, 50);
    assert_eq!(evaluation.breakdown.debt_ratio, 80);
    assert_eq!(evaluation.breakdown.history, 60);
    assert_eq!(evaluation.score, 63.5);
    assert_eq!(evaluation.verdict, Verdict::Conditional);
    assert_eq!(evaluation.risk, RiskLevel::Moderate);
}

#[test]
fn defaulted_low_income_client_is_not_eligible() {
    let evaluation = evaluator()
        .evaluate(&snapshot(
            1500.0,
            0.0,
            900.0,
            PaymentStanding::Known(PaymentState::Defaulted),
        ))
        .expect("evaluation");

    assert_eq!(evaluation.score, 46.5);
    assert_eq!(evaluation.verdict, Verdict::Ineligible);
    assert_eq!(evaluation.risk, RiskLevel::High);
    assert!(evaluation.recommendations[0].starts_with("NOT ELIGIBLE"));
}

#[test]
fn perfect_profile_reaches_the_weight_sum() {
    let profile = FinancialSnapshot {
        salary: 6000.0,
        other_income: 0.0,
        housing_expense: 0.0,
        has_property: true,
        property_value: 60_000.0,
        current_state: on_time(),
    };
    let evaluation = evaluator().evaluate(&profile).expect("evaluation");

    assert_eq!(evaluation.score, 110.0);
    assert_eq!(evaluation.verdict, Verdict::Eligible);
}

#[test]
fn zero_income_caps_the_debt_ratio() {
    let evaluation = evaluator()
        .evaluate(&snapshot(0.0, 0.0, 500.0, PaymentStanding::Pending))
        .expect("evaluation");

    assert_eq!(evaluation.debt_ratio_pct, 100.0);
    assert_eq!(evaluation.breakdown.income, 0);
    assert_eq!(evaluation.breakdown.debt_ratio, 20);
    assert_eq!(evaluation.breakdown.history, 50);
    assert_eq!(evaluation.score, 38.25);
    assert_eq!(evaluation.verdict, Verdict::Ineligible);
}

#[test]
fn debt_ratio_stays_within_unit_interval() {
    assert_eq!(debt_ratio(0.0, 0.0), 1.0);
    assert_eq!(debt_ratio(0.0, 750.0), 1.0);
    assert_eq!(debt_ratio(1000.0, 4000.0), 1.0);
    assert_eq!(debt_ratio(4000.0, 1000.0), 0.25);
    assert_eq!(debt_ratio(4000.0, 0.0), 0.0);
}

#[test]
fn band_boundaries_belong_to_the_upper_band() {
    assert_eq!(IncomeBand::classify(0.0), IncomeBand::None);
    assert_eq!(IncomeBand::classify(999.99), IncomeBand::VeryLow);
    assert_eq!(IncomeBand::classify(1000.0).score(), 40);
    assert_eq!(IncomeBand::classify(2000.0), IncomeBand::Moderate);
    assert_eq!(IncomeBand::classify(3000.0), IncomeBand::Good);
    assert_eq!(IncomeBand::classify(5000.0), IncomeBand::Strong);

    assert_eq!(ExpenseBand::classify(0.0).score(), 100);
    assert_eq!(ExpenseBand::classify(300.0), ExpenseBand::Controlled);
    assert_eq!(ExpenseBand::classify(1000.0), ExpenseBand::High);
    assert_eq!(ExpenseBand::classify(1500.0).score(), 10);

    assert_eq!(RatioBand::classify(0.25), RatioBand::Excellent);
    assert_eq!(RatioBand::classify(0.40), RatioBand::Adequate);
    assert_eq!(RatioBand::classify(0.80), RatioBand::High);
    assert_eq!(RatioBand::classify(0.81), RatioBand::Critical);
}

#[test]
fn property_only_counts_when_declared() {
    assert_eq!(PropertyBand::classify(false, 80_000.0), PropertyBand::None);
    assert_eq!(PropertyBand::classify(true, 0.0).score(), 30);
    assert_eq!(PropertyBand::classify(true, 5_000.0), PropertyBand::Modest);
    assert_eq!(PropertyBand::classify(true, 20_000.0), PropertyBand::Registered);
    assert_eq!(PropertyBand::classify(true, 50_000.0), PropertyBand::Valuable);
    assert_eq!(PropertyBand::classify(true, 5_000.0).score(), 100);
}

#[test]
fn weighted_score_is_computed_in_hundredths() {
    let config = EvaluationConfig::default();
    let breakdown = ScoreBreakdown {
        income: 100,
        expense: 100,
        debt_ratio: 0,
        history: 0,
        property: 0,
    };
    assert_eq!(breakdown.weighted_hundredths(&config.weights), 7000);
    assert_eq!(breakdown.weighted_score(&config.weights), 70.0);
}

#[test]
fn score_on_the_eligible_threshold_is_eligible() {
    // 20*35 + 100*35 + 100*20 + 50*10 + 30*10
    let evaluation = evaluator()
        .evaluate(&snapshot(500.0, 0.0, 0.0, PaymentStanding::Pending))
        .expect("evaluation");

    assert_eq!(evaluation.score, 70.0);
    assert_eq!(evaluation.verdict, Verdict::Eligible);
    assert!(evaluation.recommendations[0].starts_with("CONDITIONALLY ELIGIBLE:"));
}

#[test]
fn rejects_negative_and_non_finite_amounts() {
    let negative = evaluator().evaluate(&snapshot(-1.0, 0.0, 0.0, on_time()));
    assert_eq!(
        negative,
        Err(EvaluationError::Amount(InvalidAmount::Negative {
            field: "salary",
            value: -1.0,
        }))
    );

    let infinite = evaluator().evaluate(&snapshot(1000.0, 0.0, f64::INFINITY, on_time()));
    assert_eq!(
        infinite,
        Err(EvaluationError::Amount(InvalidAmount::NonFinite {
            field: "housing_expense",
        }))
    );
}

#[test]
fn identical_snapshots_evaluate_identically() {
    let profile = FinancialSnapshot {
        has_property: true,
        property_value: 45_000.0,
        ..snapshot(1800.0, 200.0, 750.0, PaymentStanding::Known(PaymentState::MildDelay))
    };

    let first = evaluator().evaluate(&profile).expect("evaluation");
    let second = evaluator().evaluate(&profile).expect("evaluation");

    assert_eq!(first, second);
    assert!(!first.recommendations.is_empty());
}

#[test]
fn assessment_requests_ignore_property_value_without_property() {
    let request = AssessmentRequest {
        client_id: None,
        salary: 2000.0,
        other_income: 0.0,
        housing_expense: 500.0,
        has_property: false,
        property_value: 90_000.0,
    };

    let snapshot = request.snapshot(PaymentStanding::Pending);
    assert_eq!(snapshot.property_value, 0.0);

    let owner = AssessmentRequest {
        has_property: true,
        ..request
    }
    .snapshot(PaymentStanding::Pending);
    assert_eq!(owner.property_value, 90_000.0);
}

#[test]
fn advice_opens_with_the_banner_then_orders_by_tone() {
    let config = EvaluationConfig::default();
    let profile = snapshot(
        1500.0,
        0.0,
        900.0,
        PaymentStanding::Known(PaymentState::Defaulted),
    );
    let bands = FactorBands::classify(&profile);
    let advice = recommend(&bands, 46.5, &config);

    let tones: Vec<AdviceTone> = advice.iter().map(|item| item.tone).collect();
    assert_eq!(
        tones,
        vec![
            AdviceTone::Summary,
            AdviceTone::Caution,
            AdviceTone::Caution,
            AdviceTone::Concern,
            AdviceTone::Concern,
            AdviceTone::Improvement,
            AdviceTone::Improvement,
            AdviceTone::Improvement,
        ]
    );
    assert!(advice[0].message.starts_with("NOT ELIGIBLE:"));
    assert!(advice[3].message.starts_with("Low income"));
    assert!(advice[4].message.starts_with("Critical payment history"));
    assert!(advice[5].message.starts_with("No property on record"));
    assert!(advice[7].message.contains("below 40%"));
}

#[test]
fn clean_profile_without_property_gets_a_single_improvement() {
    let config = EvaluationConfig::default();
    let bands = FactorBands::classify(&snapshot(3500.0, 500.0, 800.0, on_time()));
    let advice = recommend(&bands, 78.5, &config);

    assert_eq!(advice.len(), 6);
    assert!(advice[0].message.starts_with("ELIGIBLE:"));
    let improvements: Vec<_> = advice
        .iter()
        .filter(|item| item.tone == AdviceTone::Improvement)
        .collect();
    assert_eq!(improvements.len(), 1);
    assert!(improvements[0].message.starts_with("No property"));
}

#[test]
fn concerns_with_a_passing_score_read_as_conditional() {
    let config = EvaluationConfig::default();
    let bands = FactorBands::classify(&snapshot(
        6000.0,
        0.0,
        200.0,
        PaymentStanding::Known(PaymentState::SevereDelay),
    ));
    let advice = recommend(&bands, 88.5, &config);

    assert!(advice[0].message.starts_with("CONDITIONALLY ELIGIBLE:"));
}

#[test]
fn pending_history_produces_no_history_advice() {
    let config = EvaluationConfig::default();
    let bands = FactorBands::classify(&snapshot(3500.0, 500.0, 800.0, PaymentStanding::Pending));
    let advice = recommend(&bands, 73.5, &config);

    assert!(advice
        .iter()
        .all(|item| !item.message.to_lowercase().contains("payment history")));
}

#[test]
fn property_advice_quotes_value_in_configured_currency() {
    let config = EvaluationConfig::with_currency("USD");
    let bands = FactorBands::classify(&FinancialSnapshot {
        salary: 3500.0,
        other_income: 0.0,
        housing_expense: 800.0,
        has_property: true,
        property_value: 25_000.0,
        current_state: on_time(),
    });
    let advice = recommend(&bands, 85.5, &config);

    assert!(advice
        .iter()
        .any(|item| item.message.contains("(USD 25000.00)")));
}
