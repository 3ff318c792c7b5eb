//! TripLedger CLI
//!
//! Turn receipt photos into a travel expense ledger.

use anyhow::Result;
use clap::Parser;
use tripledger_core::{exit_codes, Config, TripLedgerError};

mod app;
mod commands;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<TripLedgerError>()
            .map(TripLedgerError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args, &config).await,
        Commands::Classify(args) => commands::classify::run(args).await,
        Commands::Ls(args) => commands::ls::run(args, &config).await,
        Commands::Rm(args) => commands::rm::run(args, &config).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Cache(args) => commands::cache::run(args, &config).await,
        Commands::Geocode => commands::geocode::run(&config).await,
        Commands::Report(args) => commands::report::run(args, &config).await,
    }
}
