//! Full resolution run

use std::path::PathBuf;

use colored::Colorize;
use modreg_core::{EngineConfig, ResolutionContext};

use super::load_registry;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ResolveArgs {
    pub registry: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub annotated: Option<PathBuf>,
    pub backup_url: Option<String>,
    pub offline: bool,
}

pub async fn run_resolve(args: ResolveArgs) -> Result<()> {
    let mut registry = load_registry(&args.registry)?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env(),
    };
    if let Some(url) = args.backup_url {
        config.backup.url = Some(url);
    }

    let mut ctx = ResolutionContext::new(config).offline(args.offline);
    let report = ctx.resolve(&mut registry).await?;

    // Fetched data is kept even when an output below cannot be written.
    let saved = ctx.finish();
    for (cache, e) in saved.failures() {
        eprintln!("{} {} cache not saved: {}", "warning:".yellow().bold(), cache, e);
    }

    match &args.output {
        Some(path) => report.write(path)?,
        None => println!("{}", report.to_json()?),
    }
    if let Some(path) = &args.annotated {
        modreg_fs::write_text(path, &serde_json::to_string_pretty(&registry)?)?;
    }

    eprintln!(
        "{} {} module versions, {} cycles, {} unresolved",
        "resolved".green().bold(),
        report.modules.len(),
        report.cycles.len(),
        report.unresolved.len()
    );
    Ok(())
}
