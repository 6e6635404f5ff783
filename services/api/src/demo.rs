use crate::infra::{
    forecast_from_ledger, InMemoryClientRepository, InMemoryPaymentRepository, LedgerForecast,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use loan_ledger::config::AppConfig;
use loan_ledger::error::AppError;
use loan_ledger::workflows::ledger_csv::LedgerCsvImporter;
use loan_ledger::workflows::portfolio::forecast::checked_horizon;
use loan_ledger::workflows::portfolio::service::{ClientForecast, RowSourceEntry};
use loan_ledger::workflows::portfolio::{
    BillingPeriod, ClientId, ClientOverview, ClientStatement, ClientSubmission, CreditEvaluation,
    CreditEvaluator, DashboardSummary, EvaluationConfig, FinancialSnapshot, LoanPortfolioService,
    PaymentStanding, PaymentState, PaymentSubmission, PortfolioServiceError, RowSource,
    TransitionMatrix,
};
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = LoanPortfolioService<InMemoryClientRepository, InMemoryPaymentRepository>;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Monthly salary
    #[arg(long)]
    pub(crate) salary: f64,
    /// Other monthly income
    #[arg(long, default_value_t = 0.0)]
    pub(crate) other_income: f64,
    /// Monthly housing expense
    #[arg(long)]
    pub(crate) housing_expense: f64,
    /// Declared property value. Omit when the borrower owns no property.
    #[arg(long)]
    pub(crate) property_value: Option<f64>,
    /// Payment standing: on_time, mild_delay, severe_delay, default or pending
    #[arg(long, default_value = "pending")]
    pub(crate) state: PaymentStanding,
}

#[derive(Args, Debug)]
pub(crate) struct ForecastArgs {
    /// Ledger CSV to train on (import layout or a previous export)
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Payment state to project from
    #[arg(long)]
    pub(crate) state: String,
    /// Months to project (defaults to APP_FORECAST_HORIZON)
    #[arg(long)]
    pub(crate) horizon: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting period (YYYY-MM). Defaults to the current month.
    #[arg(long)]
    pub(crate) period: Option<BillingPeriod>,
    /// Reference date for the statement (YYYY-MM-DD). Defaults to the period's due date.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_evaluation(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let evaluator = CreditEvaluator::new(EvaluationConfig::with_currency(
        config.ledger.currency.clone(),
    ));

    let snapshot = FinancialSnapshot {
        salary: args.salary,
        other_income: args.other_income,
        housing_expense: args.housing_expense,
        has_property: args.property_value.is_some_and(|value| value > 0.0),
        property_value: args.property_value.unwrap_or(0.0),
        current_state: args.state,
    };
    let evaluation = evaluator
        .evaluate(&snapshot)
        .map_err(PortfolioServiceError::from)?;

    render_evaluation(&evaluation, &config.ledger.currency);
    Ok(())
}

pub(crate) fn run_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let ForecastArgs {
        history,
        state,
        horizon,
    } = args;

    let config = AppConfig::load()?;
    let horizon = checked_horizon(horizon.unwrap_or(config.ledger.forecast_horizon))
        .map_err(PortfolioServiceError::from)?;
    let entries = LedgerCsvImporter::from_path(&history)?;
    let result = forecast_from_ledger(&entries, &state, horizon);

    println!("Payment forecast");
    println!("- Ledger: {}", history.display());
    render_ledger_forecast(&result);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { period, as_of } = args;

    let config = AppConfig::load()?;
    let today = Local::now().date_naive();
    let period = period.unwrap_or_else(|| BillingPeriod::new(today.year(), today.month()));
    let as_of = as_of.or_else(|| period.due_date()).unwrap_or(today);
    let currency = config.ledger.currency.clone();

    let service = LoanPortfolioService::new(
        Arc::new(InMemoryClientRepository::default()),
        Arc::new(InMemoryPaymentRepository::default()),
        &config.ledger,
    );

    println!("Loan ledger demo");
    println!("- Reporting period: {}", period.short_label());
    println!("- Statement date: {as_of}");

    let seeded = seed_portfolio(&service, period)?;
    println!(
        "- Seeded {} clients with {} payments",
        seeded.clients, seeded.payments
    );

    let listing = service.list_clients(None)?;
    render_client_listing(&listing);

    match service.dashboard(period) {
        Ok(summary) => render_dashboard(&summary, &currency),
        Err(err) => println!("  Dashboard unavailable: {err}"),
    }

    let Some(focus) = listing
        .iter()
        .max_by_key(|client| client.defaulted_payments)
        .map(|client| client.id.clone())
    else {
        println!("\nNo clients to report on");
        return Ok(());
    };

    match service.statement(&focus, as_of) {
        Ok(statement) => render_statement(&statement, &currency),
        Err(err) => println!("  Statement unavailable: {err}"),
    }

    match service.forecast_client(&focus, None) {
        Ok(forecast) => render_client_forecast(&forecast),
        Err(err) => println!("  Forecast unavailable: {err}"),
    }

    Ok(())
}

struct SampleBorrower {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    salary: f64,
    other_income: f64,
    housing_expense: f64,
    property_value: f64,
    requested_amount: f64,
    history: [PaymentState; 12],
}

use PaymentState::{Defaulted as D, MildDelay as M, OnTime as O, SevereDelay as S};

const SAMPLE_BORROWERS: [SampleBorrower; 10] = [
    SampleBorrower {
        name: "Juan Pérez",
        email: "juan.perez@example.com",
        phone: "70000001",
        salary: 3500.0,
        other_income: 500.0,
        housing_expense: 800.0,
        property_value: 85_000.0,
        requested_amount: 15_000.0,
        history: [O, O, O, O, M, O, O, O, O, O, O, O],
    },
    SampleBorrower {
        name: "María García",
        email: "maria.garcia@example.com",
        phone: "70000002",
        salary: 2000.0,
        other_income: 300.0,
        housing_expense: 600.0,
        property_value: 0.0,
        requested_amount: 8_000.0,
        history: [O, M, O, M, M, O, O, M, S, O, M, M],
    },
    SampleBorrower {
        name: "Carlos López",
        email: "carlos.lopez@example.com",
        phone: "70000003",
        salary: 1500.0,
        other_income: 0.0,
        housing_expense: 900.0,
        property_value: 0.0,
        requested_amount: 12_000.0,
        history: [S, D, D, D, D, S, D, D, D, D, D, D],
    },
    SampleBorrower {
        name: "Ana Martínez",
        email: "ana.martinez@example.com",
        phone: "70000004",
        salary: 4200.0,
        other_income: 0.0,
        housing_expense: 1000.0,
        property_value: 120_000.0,
        requested_amount: 20_000.0,
        history: [O, O, O, O, O, O, O, O, O, M, O, O],
    },
    SampleBorrower {
        name: "Pedro Rodríguez",
        email: "pedro.rodriguez@example.com",
        phone: "70000005",
        salary: 2500.0,
        other_income: 0.0,
        housing_expense: 1200.0,
        property_value: 0.0,
        requested_amount: 10_000.0,
        history: [M, S, S, D, S, M, S, S, D, S, S, S],
    },
    SampleBorrower {
        name: "Laura Fernández",
        email: "laura.fernandez@example.com",
        phone: "70000006",
        salary: 3000.0,
        other_income: 800.0,
        housing_expense: 700.0,
        property_value: 0.0,
        requested_amount: 9_000.0,
        history: [O, O, M, O, O, O, O, O, O, O, O, O],
    },
    SampleBorrower {
        name: "Miguel Torres",
        email: "miguel.torres@example.com",
        phone: "70000007",
        salary: 2200.0,
        other_income: 200.0,
        housing_expense: 750.0,
        property_value: 0.0,
        requested_amount: 7_500.0,
        history: [O, O, M, M, O, M, O, O, M, O, M, M],
    },
    SampleBorrower {
        name: "Sofía Ramírez",
        email: "sofia.ramirez@example.com",
        phone: "70000008",
        salary: 5000.0,
        other_income: 1000.0,
        housing_expense: 1500.0,
        property_value: 200_000.0,
        requested_amount: 30_000.0,
        history: [O, O, O, O, O, O, O, O, O, O, O, O],
    },
    SampleBorrower {
        name: "David Hernández",
        email: "david.hernandez@example.com",
        phone: "70000009",
        salary: 2800.0,
        other_income: 0.0,
        housing_expense: 650.0,
        property_value: 0.0,
        requested_amount: 11_000.0,
        history: [M, O, O, O, O, O, O, O, M, O, O, O],
    },
    SampleBorrower {
        name: "Elena Castro",
        email: "elena.castro@example.com",
        phone: "70000010",
        salary: 1800.0,
        other_income: 100.0,
        housing_expense: 850.0,
        property_value: 0.0,
        requested_amount: 6_000.0,
        history: [S, S, M, S, D, S, S, M, S, D, S, S],
    },
];

/// Installment base per calendar month, scaled per borrower.
const BASE_AMOUNTS: [f64; 12] = [
    2500.0, 2800.0, 3000.0, 2200.0, 2600.0, 2400.0, 2900.0, 2700.0, 3100.0, 2300.0, 2650.0,
    2850.0,
];

struct SeededPortfolio {
    clients: usize,
    payments: usize,
}

/// Registers the sample borrowers with twelve monthly payments ending at `period`.
fn seed_portfolio(
    service: &DemoService,
    period: BillingPeriod,
) -> Result<SeededPortfolio, PortfolioServiceError> {
    let first = BillingPeriod::new(period.year - 1, period.month).next();
    let mut seeded = SeededPortfolio {
        clients: 0,
        payments: 0,
    };

    for (index, borrower) in SAMPLE_BORROWERS.iter().enumerate() {
        let latest = borrower.history[borrower.history.len() - 1];
        let client = service.register_client(ClientSubmission {
            name: borrower.name.to_string(),
            email: Some(borrower.email.to_string()),
            phone: Some(borrower.phone.to_string()),
            address: None,
            current_state: latest,
            salary: borrower.salary,
            other_income: borrower.other_income,
            housing_expense: borrower.housing_expense,
            has_property: borrower.property_value > 0.0,
            property_value: borrower.property_value,
            requested_amount: borrower.requested_amount,
            notes: None,
        })?;
        seeded.clients += 1;
        seeded.payments += record_history(service, &client.id, borrower, index, first)?;
    }

    Ok(seeded)
}

fn record_history(
    service: &DemoService,
    client_id: &ClientId,
    borrower: &SampleBorrower,
    index: usize,
    first: BillingPeriod,
) -> Result<usize, PortfolioServiceError> {
    let factor = 0.9 + 0.05 * (index % 5) as f64;
    let mut current = first;

    for state in borrower.history {
        let base = BASE_AMOUNTS[(current.month as usize - 1) % BASE_AMOUNTS.len()];
        service.record_payment(
            client_id,
            PaymentSubmission {
                month: current.month,
                year: current.year,
                state,
                amount: (base * factor * 100.0).round() / 100.0,
                description: Some(format!("Monthly installment {}", current.short_label())),
            },
        )?;
        current = current.next();
    }

    Ok(borrower.history.len())
}

fn render_evaluation(evaluation: &CreditEvaluation, currency: &str) {
    println!("Credit evaluation");
    println!("- {}", evaluation.summary());
    println!("- Payment standing: {}", evaluation.current_state);
    println!(
        "- Monthly income: {currency} {:.2}",
        evaluation.monthly_income
    );
    println!(
        "- Housing expense: {currency} {:.2}",
        evaluation.monthly_expense
    );
    println!("- Debt ratio: {:.2}%", evaluation.debt_ratio_pct);
    println!(
        "- Available margin: {currency} {:.2}",
        evaluation.available_margin
    );

    let breakdown = evaluation.breakdown;
    println!("\nScore breakdown");
    for (factor, score) in [
        ("Income", breakdown.income),
        ("Housing expense", breakdown.expense),
        ("Debt ratio", breakdown.debt_ratio),
        ("Payment history", breakdown.history),
        ("Property", breakdown.property),
    ] {
        println!("- {factor}: {score}/100");
    }

    println!("\nRecommendations");
    if evaluation.recommendations.is_empty() {
        println!("none");
    } else {
        for recommendation in &evaluation.recommendations {
            println!("- {recommendation}");
        }
    }
}

fn render_ledger_forecast(result: &LedgerForecast) {
    println!(
        "- Training data: {} rows, {} client sequences, {} transitions",
        result.rows, result.sequences, result.transitions_observed
    );
    println!(
        "- Current state: {} ({} risk)",
        result.state,
        result.current_risk.level.label()
    );
    render_projection(result.forecast.steps());
    render_matrix(&result.matrix, &result.row_sources);
}

fn render_client_listing(listing: &[ClientOverview]) {
    println!("\nClients");
    if listing.is_empty() {
        println!("none");
        return;
    }
    for client in listing {
        let verdict = client
            .verdict
            .map(|verdict| verdict.label())
            .unwrap_or("Not evaluated");
        println!(
            "- {} [{}] {} | score {:.2} ({}) | {} payments, {} defaulted",
            client.name,
            client.id,
            client.current_state.label(),
            client.credit_score,
            verdict,
            client.total_payments,
            client.defaulted_payments
        );
    }
}

fn render_dashboard(summary: &DashboardSummary, currency: &str) {
    println!("\nPortfolio dashboard ({})", summary.period_label);
    println!("- Active clients: {}", summary.active_clients);
    println!("- Rejected clients: {}", summary.rejected_clients);
    println!(
        "- Collected on time: {} payments, {currency} {:.2}",
        summary.collected_on_time.count, summary.collected_on_time.amount
    );
    println!(
        "- Late payments: {}, {currency} {:.2}",
        summary.late_payments.count, summary.late_payments.amount
    );
    println!(
        "- Defaulted payments: {}, {currency} {:.2}",
        summary.defaulted_payments.count, summary.defaulted_payments.amount
    );
    println!(
        "- Delinquent amount: {currency} {:.2}",
        summary.delinquent_amount
    );
    println!("- Ledger total: {currency} {:.2}", summary.total_amount);
    println!(
        "- Alerts: {} ({} clients at risk, {} delinquent payments)",
        summary.alerts.total, summary.alerts.clients_at_risk, summary.alerts.delinquent_payments
    );

    println!("\nActive clients by state");
    if summary.state_distribution.is_empty() {
        println!("none");
    } else {
        for entry in &summary.state_distribution {
            println!("- {}: {}", entry.state_label, entry.count);
        }
    }

    println!("\nClients at risk");
    if summary.clients_at_risk.is_empty() {
        println!("none");
    } else {
        for client in &summary.clients_at_risk {
            println!(
                "- {}: {}/{} payments defaulted, debt {currency} {:.2}",
                client.name, client.defaulted_payments, client.total_payments, client.defaulted_debt
            );
        }
    }

    println!("\nRejected clients");
    if summary.rejected.is_empty() {
        println!("none");
    } else {
        for client in &summary.rejected {
            println!(
                "- {}: {} (score {:.2}, debt {currency} {:.2})",
                client.name, client.reason_label, client.credit_score, client.defaulted_debt
            );
        }
    }
}

fn render_statement(statement: &ClientStatement, currency: &str) {
    println!(
        "\nStatement for {} ({})",
        statement.name,
        statement.current_state.label()
    );
    for year in &statement.years {
        println!("{}", year.year);
        for entry in &year.payments {
            println!(
                "- {}: {} {currency} {:.2}",
                entry.period_label, entry.state_label, entry.amount
            );
        }
    }

    let totals = statement.totals;
    println!(
        "- Totals: {} payments ({} on time, {} late, {} defaulted), {currency} {:.2}",
        totals.payments, totals.on_time, totals.late, totals.defaulted, totals.total_amount
    );
    println!("- Average installment: {currency} {:.2}", totals.average_amount);
    println!(
        "- Payments made: {}, remaining: {}",
        statement.payments_made, statement.payments_remaining
    );
    println!("- Defaulted debt due: {currency} {:.2}", statement.debt_as_of);
    match &statement.next_due {
        Some(next) => println!(
            "- Next due: {} ({currency} {:.2})",
            next.period_label, next.amount
        ),
        None => println!("- Next due: none"),
    }
}

fn render_client_forecast(forecast: &ClientForecast) {
    println!(
        "\nForecast for {} (currently {}, {} risk)",
        forecast.name,
        forecast.current_state.label(),
        forecast.current_risk.level.label()
    );
    println!(
        "- Trained on {} observed transitions",
        forecast.transitions_observed
    );
    println!("- Evaluation: {}", forecast.evaluation.summary());
    render_projection(forecast.forecast.steps());
    render_matrix(&forecast.matrix, &forecast.row_sources);
}

fn render_projection(steps: impl Iterator<Item = (PaymentState, f64)>) {
    println!("\nProjected months");
    let mut any = false;
    for (offset, (state, probability)) in steps.enumerate() {
        any = true;
        println!("- +{}: {} ({probability:.2}%)", offset + 1, state.label());
    }
    if !any {
        println!("none");
    }
}

fn render_matrix(matrix: &TransitionMatrix, sources: &[RowSourceEntry]) {
    println!("\nTransition matrix");
    let header: Vec<String> = PaymentState::ordered()
        .iter()
        .map(|state| format!("{:>13}", state.as_str()))
        .collect();
    println!("  {:<13}{}", "", header.join(""));
    for entry in sources {
        let cells: Vec<String> = matrix
            .row(entry.state)
            .iter()
            .map(|probability| format!("{probability:>13.2}"))
            .collect();
        let source = match entry.source {
            RowSource::Observed => "observed",
            RowSource::ExpertDefault => "expert default",
        };
        println!(
            "  {:<13}{}  [{source}]",
            entry.state.as_str(),
            cells.join("")
        );
    }
}
