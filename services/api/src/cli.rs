use crate::demo::{run_demo, run_evaluation, run_forecast, DemoArgs, EvaluateArgs, ForecastArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_ledger::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Ledger",
    about = "Run the loan back office service or evaluate borrowers from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single financial profile without storing it
    Evaluate(EvaluateArgs),
    /// Train the payment predictor on a ledger CSV and project the next states
    Forecast(ForecastArgs),
    /// Seed a sample portfolio in memory and print its reports
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluation(args),
        Command::Forecast(args) => run_forecast(args),
        Command::Demo(args) => run_demo(args),
    }
}
