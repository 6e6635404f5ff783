use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::super::domain::{BillingPeriod, ClientId, PaymentRecord, PaymentState};

/// Anything that places a payment state at a client's billing period.
pub trait LedgerPoint {
    fn client_id(&self) -> &ClientId;
    fn period(&self) -> BillingPeriod;
    fn state(&self) -> PaymentState;

    /// Orders two points that share a billing period; the greater one counts as later.
    fn tiebreak(&self, other: &Self) -> Ordering;
}

fn chronological<P: LedgerPoint>(left: &P, right: &P) -> Ordering {
    left.period()
        .cmp(&right.period())
        .then_with(|| left.tiebreak(right))
}

impl LedgerPoint for PaymentRecord {
    fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    fn period(&self) -> BillingPeriod {
        self.period
    }

    fn state(&self) -> PaymentState {
        self.state
    }

    fn tiebreak(&self, other: &Self) -> Ordering {
        self.recorded_at
            .cmp(&other.recorded_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Group ledger entries into per-client chronological state sequences.
///
/// Sequences shorter than two entries carry no transitions and are dropped.
pub fn training_sequences<'a, P, I>(points: I) -> Vec<Vec<PaymentState>>
where
    P: LedgerPoint + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut by_client: BTreeMap<&ClientId, Vec<&P>> = BTreeMap::new();
    for point in points {
        by_client.entry(point.client_id()).or_default().push(point);
    }

    by_client
        .into_values()
        .filter(|entries| entries.len() >= 2)
        .map(|mut entries| {
            entries.sort_by(|left, right| chronological(*left, *right));
            entries.into_iter().map(|point| point.state()).collect()
        })
        .collect()
}

/// State of the most recent billing period among the given points. Points sharing that
/// period resolve through [`LedgerPoint::tiebreak`], so input order never matters.
pub fn latest_state<'a, P, I>(points: I) -> Option<PaymentState>
where
    P: LedgerPoint + 'a,
    I: IntoIterator<Item = &'a P>,
{
    points
        .into_iter()
        .max_by(|left, right| chronological(*left, *right))
        .map(|point| point.state())
}
