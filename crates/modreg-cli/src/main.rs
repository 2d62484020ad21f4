//! Module registry resolver CLI
//!
//! Resolves version selections, dependency cycles and repository metadata
//! for a registry snapshot.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::ResolveArgs;
use error::{CliError, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose).map_err(|e| CliError::user(format!("failed to initialize logging: {}", e)))?;
    tracing::debug!("verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd).await,
        None => {
            println!("{} module registry resolver", "modreg".green().bold());
            println!();
            println!("Run {} for available commands.", "modreg --help".cyan());
            Ok(())
        }
    }
}

async fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Resolve {
            registry,
            config,
            output,
            annotated,
            backup_url,
            offline,
        } => {
            commands::run_resolve(ResolveArgs {
                registry,
                config,
                output,
                annotated,
                backup_url,
                offline,
            })
            .await
        }
        Commands::Mvs {
            registry,
            dev,
            json,
            roots,
        } => commands::run_mvs(&registry, &roots, dev, json),
        Commands::Cycles { registry, json } => commands::run_cycles(&registry, json),
    }
}
