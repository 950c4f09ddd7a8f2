use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nbr_cli::cli::{Cli, Commands};
use nbr_cli::config::CalculatorConfig;

mod commands;

fn run(cli: Cli) -> Result<()> {
    let config = CalculatorConfig::load(cli.config.as_deref())?;
    let tables = config.reference_data(cli.data_dir.as_deref());
    debug!("Using {} reference tables", tables.source().describe());

    match cli.command {
        Commands::Size { project, format } => {
            commands::size::handle(&project, format, &config, &tables)
        }
        Commands::Conduits { project, format } => {
            commands::conduits::handle(&project, format, &config, &tables)
        }
        Commands::Validate { project } => commands::validate::handle(&project),
        Commands::Tables { command } => commands::tables::handle(&command, &config, &tables),
        Commands::New { out, name, force } => commands::new::handle(&out, &name, force),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(cli.log_level.into()))
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
