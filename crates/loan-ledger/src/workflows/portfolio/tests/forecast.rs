use super::common::record_fixture;
use crate::workflows::portfolio::domain::{BillingPeriod, PaymentRecord, PaymentState};
use crate::workflows::portfolio::evaluation::RiskLevel;
use crate::workflows::portfolio::forecast::{
    checked_horizon, latest_state, risk_of, risk_of_label, training_sequences, HorizonOutOfRange,
    MarkovPredictor, RowSource, TransitionMatrix, MAX_FORECAST_HORIZON,
};
use chrono::Duration;

use PaymentState::{Defaulted, MildDelay, OnTime, SevereDelay};

#[test]
fn untrained_predictor_follows_the_expert_matrix() {
    let predictor = MarkovPredictor::train(&[]);
    let forecast = predictor.predict(OnTime, 3);

    assert_eq!(forecast.states, vec![OnTime, OnTime, OnTime]);
    assert_eq!(forecast.probabilities, vec![70.0, 70.0, 70.0]);
    assert_eq!(predictor.transitions_observed(), 0);
    assert_eq!(predictor.row_source(Defaulted), RowSource::ExpertDefault);
}

#[test]
fn single_element_sequences_carry_no_transitions() {
    let predictor = MarkovPredictor::train(&[vec![Defaulted], vec![MildDelay]]);

    assert_eq!(predictor.transitions_observed(), 0);
    assert_eq!(predictor.matrix(), &TransitionMatrix::expert_default());
}

#[test]
fn trained_rows_are_normalized_counts() {
    let predictor =
        MarkovPredictor::train(&[vec![OnTime, OnTime, MildDelay, MildDelay, MildDelay]]);
    let matrix = predictor.matrix();

    assert_eq!(predictor.transitions_observed(), 4);
    assert_eq!(matrix.probability(OnTime, OnTime), 0.5);
    assert_eq!(matrix.probability(OnTime, MildDelay), 0.5);
    assert_eq!(matrix.probability(MildDelay, MildDelay), 1.0);
    assert_eq!(predictor.row_source(OnTime), RowSource::Observed);
    assert_eq!(predictor.row_source(MildDelay), RowSource::Observed);
    assert_eq!(predictor.row_source(SevereDelay), RowSource::ExpertDefault);
    assert_eq!(
        matrix.row(SevereDelay),
        TransitionMatrix::expert_row(SevereDelay)
    );
}

#[test]
fn every_row_sums_to_one() {
    let predictor = MarkovPredictor::train(&[
        vec![OnTime, MildDelay, SevereDelay, Defaulted, Defaulted],
        vec![MildDelay, OnTime, OnTime],
        vec![SevereDelay, MildDelay],
    ]);

    for state in PaymentState::ordered() {
        let sum: f64 = predictor.matrix().row(state).iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "row {state} sums to {sum}");
    }
}

#[test]
fn ties_resolve_to_the_earliest_state() {
    let predictor =
        MarkovPredictor::train(&[vec![OnTime, OnTime, MildDelay, MildDelay, MildDelay]]);
    let forecast = predictor.predict(OnTime, 2);

    assert_eq!(forecast.states, vec![OnTime, OnTime]);
    assert_eq!(forecast.probabilities, vec![50.0, 50.0]);
}

#[test]
fn greedy_projection_chains_from_each_predicted_state() {
    let predictor = MarkovPredictor::train(&[
        vec![OnTime, MildDelay, SevereDelay, SevereDelay, Defaulted],
        vec![MildDelay, SevereDelay, Defaulted, Defaulted],
    ]);

    for start in PaymentState::ordered() {
        let full = predictor.predict(start, 5);
        assert_eq!(full.len(), 5);
        let tail = predictor.predict(full.states[0], 4);
        assert_eq!(&full.states[1..], tail.states.as_slice());
        assert_eq!(&full.probabilities[1..], tail.probabilities.as_slice());
    }
}

#[test]
fn zero_horizon_yields_an_empty_forecast() {
    let forecast = MarkovPredictor::untrained().predict(MildDelay, 0);
    assert!(forecast.is_empty());
}

#[test]
fn oversized_horizons_are_rejected_and_never_allocated() {
    assert_eq!(checked_horizon(MAX_FORECAST_HORIZON), Ok(MAX_FORECAST_HORIZON));
    assert_eq!(
        checked_horizon(usize::MAX),
        Err(HorizonOutOfRange {
            requested: usize::MAX,
            max: MAX_FORECAST_HORIZON,
        })
    );

    let predictor = MarkovPredictor::untrained();
    assert_eq!(predictor.predict(OnTime, usize::MAX).len(), MAX_FORECAST_HORIZON);
    assert_eq!(
        predictor.predict_label("late", usize::MAX).len(),
        MAX_FORECAST_HORIZON
    );
}

#[test]
fn unrecognized_label_forecasts_on_time_at_even_odds() {
    let forecast = MarkovPredictor::untrained().predict_label("late", 3);

    assert_eq!(forecast.states, vec![OnTime, OnTime, OnTime]);
    assert_eq!(forecast.probabilities, vec![50.0, 50.0, 50.0]);

    let recognized = MarkovPredictor::untrained().predict_label("Severe Delay", 1);
    assert_eq!(recognized.steps().collect::<Vec<_>>(), vec![(SevereDelay, 40.0)]);
}

#[test]
fn risk_follows_the_payment_state() {
    assert_eq!(risk_of(OnTime).level, RiskLevel::Low);
    assert_eq!(risk_of(MildDelay).tag, "warning");
    assert_eq!(risk_of(SevereDelay).level, RiskLevel::High);
    assert_eq!(risk_of(Defaulted).tag, "danger");

    let unknown = risk_of_label("late");
    assert_eq!(unknown.level, RiskLevel::Unknown);
    assert_eq!(unknown.tag, "secondary");
}

#[test]
fn matrix_serializes_as_nested_state_maps() {
    let json = serde_json::to_value(TransitionMatrix::expert_default()).expect("serialize");

    assert_eq!(json["on_time"]["on_time"], 0.7);
    assert_eq!(json["default"]["default"], 0.5);
    assert_eq!(json["mild_delay"]["severe_delay"], 0.2);
}

#[test]
fn sequences_group_per_client_in_chronological_order() {
    let ledger = vec![
        record_fixture("p1", "cli-a", BillingPeriod::new(2025, 1), MildDelay, 100.0),
        record_fixture("p2", "cli-a", BillingPeriod::new(2024, 12), OnTime, 100.0),
        record_fixture("p3", "cli-a", BillingPeriod::new(2024, 2), Defaulted, 100.0),
        record_fixture("p4", "cli-b", BillingPeriod::new(2025, 3), OnTime, 80.0),
    ];

    let sequences = training_sequences(&ledger);

    assert_eq!(sequences, vec![vec![Defaulted, OnTime, MildDelay]]);
    assert_eq!(latest_state(&ledger[..3]), Some(MildDelay));
    assert_eq!(latest_state(&ledger[..0]), None);
}

fn same_period_pair() -> (PaymentRecord, PaymentRecord) {
    let period = BillingPeriod::new(2025, 4);
    let earlier = record_fixture("pay-000007", "cli-a", period, OnTime, 100.0);
    let mut later = record_fixture("pay-000003", "cli-a", period, Defaulted, 100.0);
    later.recorded_at = earlier.recorded_at + Duration::minutes(5);
    (earlier, later)
}

#[test]
fn shared_periods_order_by_recording_time_regardless_of_input_order() {
    let (earlier, later) = same_period_pair();
    let forward = vec![earlier.clone(), later.clone()];
    let reversed = vec![later, earlier];

    assert_eq!(training_sequences(&forward), vec![vec![OnTime, Defaulted]]);
    assert_eq!(training_sequences(&reversed), vec![vec![OnTime, Defaulted]]);
    assert_eq!(latest_state(&forward), Some(Defaulted));
    assert_eq!(latest_state(&reversed), Some(Defaulted));
}

#[test]
fn shared_periods_recorded_together_fall_back_to_payment_id() {
    let period = BillingPeriod::new(2025, 4);
    let first = record_fixture("pay-000001", "cli-a", period, SevereDelay, 100.0);
    let second = record_fixture("pay-000002", "cli-a", period, MildDelay, 100.0);

    for ledger in [
        vec![first.clone(), second.clone()],
        vec![second.clone(), first.clone()],
    ] {
        assert_eq!(training_sequences(&ledger), vec![vec![SevereDelay, MildDelay]]);
        assert_eq!(latest_state(&ledger), Some(MildDelay));
    }
}

#[test]
fn training_is_independent_of_storage_order() {
    let (earlier, later) = same_period_pair();
    let mut ledger = vec![
        record_fixture("pay-000010", "cli-a", BillingPeriod::new(2025, 2), MildDelay, 100.0),
        record_fixture("pay-000011", "cli-a", BillingPeriod::new(2025, 3), OnTime, 100.0),
        earlier,
        later,
        record_fixture("pay-000012", "cli-b", BillingPeriod::new(2025, 1), SevereDelay, 80.0),
        record_fixture("pay-000013", "cli-b", BillingPeriod::new(2025, 2), Defaulted, 80.0),
    ];

    let forward = MarkovPredictor::train(&training_sequences(&ledger));
    let start = latest_state(&ledger).expect("ledger has entries");
    ledger.reverse();
    let backward = MarkovPredictor::train(&training_sequences(&ledger));

    assert_eq!(forward, backward);
    assert_eq!(latest_state(&ledger), Some(start));
    assert_eq!(forward.predict(start, 6), backward.predict(start, 6));
}
