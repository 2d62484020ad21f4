//! Cycles command

use std::path::Path;

use colored::Colorize;
use modreg_core::Analysis;

use super::load_registry;
use crate::error::Result;

pub fn run_cycles(registry: &Path, json: bool) -> Result<()> {
    let registry = load_registry(registry)?;
    let analysis = Analysis::of(&registry)?;
    let cycles = analysis.cycles.cycles();

    if json {
        let out: Vec<serde_json::Value> = cycles
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "members": c.members.iter().map(ToString::to_string).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if cycles.is_empty() {
        println!("{} no dependency cycles", "OK".green().bold());
        return Ok(());
    }
    for cycle in cycles {
        println!("{}", cycle.name.yellow().bold());
        for member in &cycle.members {
            println!("  {}", member);
        }
    }
    Ok(())
}
