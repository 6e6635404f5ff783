//! First-order Markov forecasting over payment states.
//!
//! The predictor is rebuilt from the full ledger for every request and never cached, so
//! concurrent callers each work on their own matrix.

mod history;
mod matrix;

pub use history::{latest_state, training_sequences, LedgerPoint};
pub use matrix::{RowSource, TransitionMatrix};

use serde::Serialize;

use super::domain::PaymentState;
use super::evaluation::RiskLevel;
use super::round_to_cents;

/// Stated probability for steps taken from an unrecognized starting state.
const UNRECOGNIZED_STEP_PCT: f64 = 50.0;

/// Longest projection accepted from callers, in months.
pub const MAX_FORECAST_HORIZON: usize = 120;

/// Requested horizon longer than [`MAX_FORECAST_HORIZON`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("forecast horizon {requested} exceeds the maximum of {max} months")]
pub struct HorizonOutOfRange {
    pub requested: usize,
    pub max: usize,
}

/// Validate a caller-supplied horizon before any work is scheduled for it.
pub fn checked_horizon(horizon: usize) -> Result<usize, HorizonOutOfRange> {
    if horizon > MAX_FORECAST_HORIZON {
        return Err(HorizonOutOfRange {
            requested: horizon,
            max: MAX_FORECAST_HORIZON,
        });
    }
    Ok(horizon)
}

/// Transition model estimated from payment histories.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovPredictor {
    matrix: TransitionMatrix,
    sources: [RowSource; 4],
    transitions_observed: u32,
}

impl MarkovPredictor {
    /// Predictor backed entirely by the expert matrix.
    pub fn untrained() -> Self {
        Self {
            matrix: TransitionMatrix::expert_default(),
            sources: [RowSource::ExpertDefault; 4],
            transitions_observed: 0,
        }
    }

    pub fn train(sequences: &[Vec<PaymentState>]) -> Self {
        let mut counts = [[0u32; 4]; 4];
        let mut transitions_observed = 0;

        for sequence in sequences {
            for pair in sequence.windows(2) {
                counts[pair[0].index()][pair[1].index()] += 1;
                transitions_observed += 1;
            }
        }

        if transitions_observed == 0 {
            tracing::warn!("no payment transitions observed; using expert transition matrix");
            return Self::untrained();
        }

        let (matrix, sources) = TransitionMatrix::from_counts(&counts);
        let fallback_rows = sources
            .iter()
            .filter(|source| **source == RowSource::ExpertDefault)
            .count();
        tracing::debug!(
            sequences = sequences.len(),
            transitions = transitions_observed,
            fallback_rows,
            "trained payment transition matrix"
        );

        Self {
            matrix,
            sources,
            transitions_observed,
        }
    }

    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    pub fn row_source(&self, from: PaymentState) -> RowSource {
        self.sources[from.index()]
    }

    pub fn transitions_observed(&self) -> u32 {
        self.transitions_observed
    }

    /// Greedy projection: each step takes the most probable successor of the previous one.
    /// Horizons past [`MAX_FORECAST_HORIZON`] are truncated to it.
    pub fn predict(&self, current: PaymentState, horizon: usize) -> Forecast {
        let horizon = horizon.min(MAX_FORECAST_HORIZON);
        let mut forecast = Forecast::with_capacity(horizon);
        let mut state = current;
        for _ in 0..horizon {
            let (next, probability) = self.matrix.most_likely(state);
            forecast.push(next, round_to_cents(probability * 100.0));
            state = next;
        }
        forecast
    }

    /// Predict from a raw state label. Unrecognized labels yield `on_time` at 50% for
    /// every step without advancing.
    pub fn predict_label(&self, current: &str, horizon: usize) -> Forecast {
        match current.parse::<PaymentState>() {
            Ok(state) => self.predict(state, horizon),
            Err(err) => {
                tracing::warn!(error = %err, "forecasting from unrecognized state");
                let horizon = horizon.min(MAX_FORECAST_HORIZON);
                let mut forecast = Forecast::with_capacity(horizon);
                for _ in 0..horizon {
                    forecast.push(PaymentState::OnTime, UNRECOGNIZED_STEP_PCT);
                }
                forecast
            }
        }
    }
}

impl Default for MarkovPredictor {
    fn default() -> Self {
        Self::untrained()
    }
}

/// Two aligned lists: projected states and the percentage stated for each step.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Forecast {
    pub states: Vec<PaymentState>,
    pub probabilities: Vec<f64>,
}

impl Forecast {
    fn with_capacity(horizon: usize) -> Self {
        Self {
            states: Vec::with_capacity(horizon),
            probabilities: Vec::with_capacity(horizon),
        }
    }

    fn push(&mut self, state: PaymentState, probability_pct: f64) {
        self.states.push(state);
        self.probabilities.push(probability_pct);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = (PaymentState, f64)> + '_ {
        self.states
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }
}

/// Risk grade and presentation tag for a payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub tag: &'static str,
}

impl From<RiskLevel> for RiskAssessment {
    fn from(level: RiskLevel) -> Self {
        Self {
            level,
            tag: level.tag(),
        }
    }
}

pub const fn state_risk(state: PaymentState) -> RiskLevel {
    match state {
        PaymentState::OnTime => RiskLevel::Low,
        PaymentState::MildDelay => RiskLevel::Moderate,
        PaymentState::SevereDelay => RiskLevel::High,
        PaymentState::Defaulted => RiskLevel::VeryHigh,
    }
}

pub fn risk_of(state: PaymentState) -> RiskAssessment {
    state_risk(state).into()
}

/// Risk for a raw state label; unrecognized labels map to `Unknown`.
pub fn risk_of_label(label: &str) -> RiskAssessment {
    label
        .parse::<PaymentState>()
        .map(state_risk)
        .unwrap_or(RiskLevel::Unknown)
        .into()
}
