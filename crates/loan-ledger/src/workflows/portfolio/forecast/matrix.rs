use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::super::domain::PaymentState;

const STATE_COUNT: usize = 4;

/// Expert rows used wherever training data is silent, indexed by `PaymentState::index`.
const EXPERT_ROWS: [[f64; STATE_COUNT]; STATE_COUNT] = [
    [0.70, 0.20, 0.08, 0.02],
    [0.30, 0.40, 0.20, 0.10],
    [0.10, 0.20, 0.40, 0.30],
    [0.05, 0.15, 0.30, 0.50],
];

/// Whether a matrix row was estimated from data or substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    Observed,
    ExpertDefault,
}

/// First-order transition probabilities over the four payment states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionMatrix {
    rows: [[f64; STATE_COUNT]; STATE_COUNT],
}

impl TransitionMatrix {
    pub const fn expert_default() -> Self {
        Self { rows: EXPERT_ROWS }
    }

    pub const fn expert_row(from: PaymentState) -> [f64; STATE_COUNT] {
        EXPERT_ROWS[from.index()]
    }

    /// Normalize raw transition counts; rows without observations take the expert row.
    pub(crate) fn from_counts(
        counts: &[[u32; STATE_COUNT]; STATE_COUNT],
    ) -> (Self, [RowSource; STATE_COUNT]) {
        let mut rows = EXPERT_ROWS;
        let mut sources = [RowSource::ExpertDefault; STATE_COUNT];

        for (index, row_counts) in counts.iter().enumerate() {
            let total: u32 = row_counts.iter().sum();
            if total == 0 {
                continue;
            }
            for (cell, count) in rows[index].iter_mut().zip(row_counts) {
                *cell = f64::from(*count) / f64::from(total);
            }
            sources[index] = RowSource::Observed;
        }

        (Self { rows }, sources)
    }

    pub fn row(&self, from: PaymentState) -> [f64; STATE_COUNT] {
        self.rows[from.index()]
    }

    pub fn probability(&self, from: PaymentState, to: PaymentState) -> f64 {
        self.rows[from.index()][to.index()]
    }

    /// Most likely successor; ties resolve to the earliest state in enumeration order.
    pub fn most_likely(&self, from: PaymentState) -> (PaymentState, f64) {
        let row = self.row(from);
        let mut best = (PaymentState::OnTime, row[PaymentState::OnTime.index()]);
        for state in PaymentState::ordered().into_iter().skip(1) {
            let probability = row[state.index()];
            if probability > best.1 {
                best = (state, probability);
            }
        }
        best
    }
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self::expert_default()
    }
}

/// Serializes as `{ from: { to: probability } }` keyed by state labels.
impl Serialize for TransitionMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a [f64; STATE_COUNT]);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(STATE_COUNT))?;
                for state in PaymentState::ordered() {
                    map.serialize_entry(state.as_str(), &self.0[state.index()])?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(STATE_COUNT))?;
        for state in PaymentState::ordered() {
            map.serialize_entry(state.as_str(), &Row(&self.rows[state.index()]))?;
        }
        map.end()
    }
}
