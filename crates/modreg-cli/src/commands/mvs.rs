//! Selection for explicit roots

use std::path::Path;

use colored::Colorize;
use modreg_core::Analysis;
use modreg_graph::{DepKind, Root};

use super::load_registry;
use crate::error::Result;

pub fn run_mvs(registry: &Path, roots: &[String], dev: bool, json: bool) -> Result<()> {
    let registry = load_registry(registry)?;
    let analysis = Analysis::of(&registry)?;
    let roots: Vec<Root> = roots.iter().map(|r| Root::parse(r)).collect();
    let kind = if dev { DepKind::Dev } else { DepKind::Regular };

    let selection = analysis.select(kind, &roots)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }
    for (name, version) in &selection {
        println!("{:<30} {}", name.green(), version);
    }
    Ok(())
}
