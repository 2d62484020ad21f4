//! Command implementations for modreg-cli

pub mod cycles;
pub mod mvs;
pub mod resolve;

pub use cycles::run_cycles;
pub use mvs::run_mvs;
pub use resolve::{ResolveArgs, run_resolve};

use std::path::Path;

use modreg_model::Registry;

use crate::error::Result;

/// Read a registry snapshot from disk.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let bytes = modreg_fs::read_bytes(path)?;
    let registry = Registry::from_json(&bytes)?;
    tracing::debug!("loaded {} modules from {}", registry.modules.len(), path.display());
    Ok(registry)
}
