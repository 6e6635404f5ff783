use chrono::NaiveDate;

use super::super::domain::{Client, PaymentRecord, PaymentState};
use super::super::round_to_cents;
use super::views::{
    ClientStatement, NextDueView, StatementEntryView, StatementTotals, StatementYearView,
};

/// Account statement for one client. `as_of` bounds which defaulted periods count as
/// debt already due.
pub fn statement(client: &Client, payments: &[PaymentRecord], as_of: NaiveDate) -> ClientStatement {
    let mut ordered: Vec<&PaymentRecord> = payments
        .iter()
        .filter(|payment| payment.client_id == client.id)
        .collect();
    ordered.sort_by(|a, b| b.period.cmp(&a.period));

    let mut years: Vec<StatementYearView> = Vec::new();
    for payment in &ordered {
        let entry = StatementEntryView {
            payment_id: payment.id.clone(),
            period: payment.period,
            period_label: payment.period.short_label(),
            state: payment.state,
            state_label: payment.state.label(),
            amount: payment.amount,
            description: payment.description.clone(),
        };
        match years.last_mut() {
            Some(year) if year.year == payment.period.year => year.payments.push(entry),
            _ => years.push(StatementYearView {
                year: payment.period.year,
                payments: vec![entry],
            }),
        }
    }

    let count_of = |state: PaymentState| {
        ordered
            .iter()
            .filter(|payment| payment.state == state)
            .count()
    };
    let on_time = count_of(PaymentState::OnTime);
    let defaulted = count_of(PaymentState::Defaulted);
    let late = ordered.len() - on_time - defaulted;

    let total_amount: f64 = ordered.iter().map(|payment| payment.amount).sum();
    let defaulted_debt: f64 = ordered
        .iter()
        .filter(|payment| payment.state == PaymentState::Defaulted)
        .map(|payment| payment.amount)
        .sum();
    let debt_as_of: f64 = ordered
        .iter()
        .filter(|payment| payment.state == PaymentState::Defaulted)
        .filter(|payment| {
            payment
                .period
                .due_date()
                .is_some_and(|due| due <= as_of)
        })
        .map(|payment| payment.amount)
        .sum();
    let average_amount = if ordered.is_empty() {
        0.0
    } else {
        total_amount / ordered.len() as f64
    };

    let latest = ordered.first();
    let next_due = latest.map(|payment| {
        let period = payment.period.next();
        NextDueView {
            period,
            period_label: period.short_label(),
            due_date: period.due_date(),
            amount: payment.amount,
        }
    });

    let payments_made = on_time + late;

    ClientStatement {
        client_id: client.id.clone(),
        name: client.name.clone(),
        current_state: client.current_state,
        years,
        totals: StatementTotals {
            payments: ordered.len(),
            on_time,
            late,
            defaulted,
            total_amount: round_to_cents(total_amount),
            defaulted_debt: round_to_cents(defaulted_debt),
            average_amount: round_to_cents(average_amount),
        },
        payments_made,
        payments_remaining: ordered.len() - payments_made,
        debt_as_of: round_to_cents(debt_as_of),
        last_period: latest.map(|payment| payment.period),
        next_due,
    }
}
