use crate::demo::{run_demo, run_dispatch, run_grace, DemoArgs, DispatchArgs, GraceArgs};
use crate::server;
use billing_ai::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Clinic Billing Automation",
    about = "Run the billing reminder and grace-scoring service from the command line",
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
    /// Billing utilities for local runs and stakeholder demos
    Billing {
        #[command(subcommand)]
        command: BillingCommand,
    },
    /// Run an end-to-end CLI demo covering dispatch and grace scoring
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum BillingCommand {
    /// Run one reminder dispatch pass over seeded invoices
    Reminders(DispatchArgs),
    /// Print grace-period evaluations for the demo tenants
    Grace(GraceArgs),
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
        Command::Billing {
            command: BillingCommand::Reminders(args),
        } => run_dispatch(args).await,
        Command::Billing {
            command: BillingCommand::Grace(args),
        } => run_grace(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
