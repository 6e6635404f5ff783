use std::collections::HashMap;

use super::super::domain::{BillingPeriod, Client, ClientId, PaymentRecord, PaymentState};
use super::super::round_to_cents;
use super::views::{
    AlertCounts, AmountTally, AtRiskClientView, DashboardSummary, RejectedClientView,
    RejectionReason, StateCountEntry,
};

const AT_RISK_LIMIT: usize = 5;
const VERY_HIGH_RISK_SCORE: f64 = 30.0;

#[derive(Debug, Default, Clone, Copy)]
struct ClientLedger {
    payments: usize,
    defaulted: usize,
    defaulted_debt: f64,
}

/// Aggregate the portfolio into the dashboard figures for one reference period.
pub fn dashboard(
    clients: &[Client],
    payments: &[PaymentRecord],
    period: BillingPeriod,
) -> DashboardSummary {
    let mut ledgers: HashMap<&ClientId, ClientLedger> = HashMap::new();
    let mut collected_on_time = Tally::default();
    let mut late = Tally::default();
    let mut defaulted = Tally::default();
    let mut total_amount = 0.0;

    for payment in payments {
        let ledger = ledgers.entry(&payment.client_id).or_default();
        ledger.payments += 1;
        total_amount += payment.amount;

        match payment.state {
            PaymentState::OnTime if payment.period == period => {
                collected_on_time.add(payment.amount)
            }
            PaymentState::OnTime => {}
            PaymentState::MildDelay | PaymentState::SevereDelay => late.add(payment.amount),
            PaymentState::Defaulted => {
                ledger.defaulted += 1;
                ledger.defaulted_debt += payment.amount;
                defaulted.add(payment.amount);
            }
        }
    }

    let ledger_of = |client: &Client| ledgers.get(&client.id).copied().unwrap_or_default();

    let (rejected_clients, active_clients): (Vec<&Client>, Vec<&Client>) =
        clients.iter().partition(|client| client.is_rejected());

    let state_distribution = PaymentState::ordered()
        .into_iter()
        .filter_map(|state| {
            let count = active_clients
                .iter()
                .filter(|client| client.current_state == state)
                .count();
            (count > 0).then_some(StateCountEntry {
                state,
                state_label: state.label(),
                count,
            })
        })
        .collect();

    let mut clients_at_risk: Vec<AtRiskClientView> = active_clients
        .iter()
        .copied()
        .filter_map(|client| {
            let ledger = ledger_of(client);
            is_at_risk(client, &ledger).then(|| AtRiskClientView {
                client_id: client.id.clone(),
                name: client.name.clone(),
                email: client.contact.email.clone(),
                current_state: client.current_state,
                total_payments: ledger.payments,
                defaulted_payments: ledger.defaulted,
                defaulted_debt: round_to_cents(ledger.defaulted_debt),
            })
        })
        .collect();
    clients_at_risk.sort_by(|a, b| {
        b.defaulted_payments
            .cmp(&a.defaulted_payments)
            .then_with(|| b.defaulted_debt.total_cmp(&a.defaulted_debt))
    });
    clients_at_risk.truncate(AT_RISK_LIMIT);

    let mut rejected: Vec<RejectedClientView> = rejected_clients
        .iter()
        .copied()
        .map(|client| {
            let reason = rejection_reason(client);
            RejectedClientView {
                client_id: client.id.clone(),
                name: client.name.clone(),
                email: client.contact.email.clone(),
                phone: client.contact.phone.clone(),
                current_state: client.current_state,
                credit_score: client.credit_score,
                defaulted_debt: round_to_cents(ledger_of(client).defaulted_debt),
                reason,
                reason_label: reason.label(),
            }
        })
        .collect();
    rejected.sort_by(|a, b| a.credit_score.total_cmp(&b.credit_score));

    let at_risk_total = clients
        .iter()
        .filter(|&client| is_at_risk(client, &ledger_of(client)))
        .count();
    let delinquent_payments = late.count + defaulted.count;

    DashboardSummary {
        period,
        period_label: period.short_label(),
        active_clients: active_clients.len(),
        rejected_clients: rejected_clients.len(),
        state_distribution,
        collected_on_time: collected_on_time.finish(),
        late_payments: late.finish(),
        defaulted_payments: defaulted.finish(),
        delinquent_amount: round_to_cents(late.amount + defaulted.amount),
        total_amount: round_to_cents(total_amount),
        clients_at_risk,
        rejected,
        alerts: AlertCounts {
            clients_at_risk: at_risk_total,
            delinquent_payments,
            total: at_risk_total + delinquent_payments,
        },
    }
}

fn is_at_risk(client: &Client, ledger: &ClientLedger) -> bool {
    ledger.defaulted > 0 || client.current_state == PaymentState::Defaulted
}

pub fn rejection_reason(client: &Client) -> RejectionReason {
    if client.current_state == PaymentState::Defaulted {
        RejectionReason::PermanentDefault
    } else if client.credit_score < VERY_HIGH_RISK_SCORE {
        RejectionReason::VeryHighRisk
    } else if client.current_state == PaymentState::SevereDelay {
        RejectionReason::ChronicLatePayer
    } else {
        RejectionReason::Uncollectible
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    count: usize,
    amount: f64,
}

impl Tally {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }

    fn finish(self) -> AmountTally {
        AmountTally {
            count: self.count,
            amount: round_to_cents(self.amount),
        }
    }
}
