//! WaterWise command-line tool
//!
//! Prints JSON on stdout; logs go to stderr.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::Command;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::CliConfig;

fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run(cli.command) {
        error!(error = %e, "waterwise failed");
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let config = CliConfig::load()?;
    debug!(?config, "loaded configuration");

    let output = match command {
        Command::Bill(args) => commands::bill(&config.tariff, &args)?,
        Command::Estimate(args) => commands::estimate(&config.tariff, &args)?,
        Command::Analyze(args) => commands::analyze(&config.tariff, &args)?,
        Command::Usage(args) => commands::usage(&args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
