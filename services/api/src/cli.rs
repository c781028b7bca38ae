use crate::commands::{run_predict, run_status, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use salary_predictor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Salary Predictor",
    about = "Serve salary predictions over HTTP or run them from the command line",
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
    /// Load the configured artifacts and predict a single salary
    Predict(PredictArgs),
    /// Report which artifacts load from the configured paths
    Status,
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
        Command::Predict(args) => run_predict(args),
        Command::Status => run_status(),
    }
}
