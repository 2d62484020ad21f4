//! Orchestration of a module registry resolution run
//!
//! [`EngineConfig`] is read once; a [`ResolutionContext`] built from it owns
//! the caches for the duration of the run and threads them through every
//! phase. Nothing is global.
//!
//! ```no_run
//! # async fn run(mut registry: modreg_model::Registry) -> modreg_core::Result<()> {
//! use modreg_core::{EngineConfig, ResolutionContext};
//!
//! let mut ctx = ResolutionContext::new(EngineConfig::from_env());
//! let report = ctx.resolve(&mut registry).await?;
//! println!("{}", report.to_json()?);
//! let saved = ctx.finish();
//! assert!(saved.is_ok());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod report;

pub use config::EngineConfig;
pub use context::{Analysis, Resolution, ResolutionContext};
pub use error::{Error, Result};
pub use report::{
    CycleReport, EnrichmentSummary, ModuleVersionReport, ResolutionReport, SelectionPair,
};
