//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Module registry resolver - select versions, detect cycles, enrich metadata
#[derive(Parser, Debug)]
#[command(name = "modreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the full pipeline and write a resolution report
    ///
    /// Examples:
    ///   modreg resolve --registry registry.json
    ///   modreg resolve --registry registry.json --output report.json --offline
    ///   modreg resolve --registry registry.json --config modreg.toml
    Resolve {
        /// Registry snapshot (JSON)
        #[arg(short, long)]
        registry: PathBuf,

        /// Engine configuration (TOML)
        #[arg(short, long, env = "MODREG_CONFIG")]
        config: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the annotated registry snapshot here
        #[arg(long)]
        annotated: Option<PathBuf>,

        /// Override the configured backup registry URL
        #[arg(long)]
        backup_url: Option<String>,

        /// Skip every network phase
        #[arg(long)]
        offline: bool,
    },

    /// Print the versions selected for the given roots
    ///
    /// Roots are module names (highest version) or name@version ids.
    Mvs {
        /// Registry snapshot (JSON)
        #[arg(short, long)]
        registry: PathBuf,

        /// Select over dev dependencies instead of regular ones
        #[arg(long)]
        dev: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Roots to select from
        #[arg(required = true)]
        roots: Vec<String>,
    },

    /// Print the dependency cycles of a registry
    Cycles {
        /// Registry snapshot (JSON)
        #[arg(short, long)]
        registry: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
