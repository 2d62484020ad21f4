//! Resolution report

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use modreg_enrich::EnrichmentReport;
use modreg_graph::{ResolvedDependency, Selection};
use modreg_model::{RepositoryMetadata, UrlStatus};
use serde::Serialize;

use crate::error::{Error, Result};

/// Everything one run resolved. Maps are sorted so the JSON is stable apart
/// from `generated_at`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub generated_at: DateTime<Utc>,
    /// Keyed by `name@version`
    pub modules: BTreeMap<String, ModuleVersionReport>,
    pub cycles: Vec<CycleReport>,
    pub unresolved: Vec<String>,
    pub registry_selection: SelectionPair,
    /// One narrowed version per ranked module
    pub preferred_versions: BTreeMap<String, String>,
    /// Keyed by canonical identity
    pub repositories: BTreeMap<String, RepositoryMetadata>,
    pub enrichment: EnrichmentSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionPair {
    pub regular: Selection,
    pub dev: Selection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleVersionReport {
    /// Selection rooted here, without this module's own entry
    pub selection: SelectionPair,
    pub rank: u32,
    pub latest: bool,
    pub dependencies: Vec<ResolvedDependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_status: Option<UrlStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_status: Option<UrlStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub name: String,
    pub members: Vec<String>,
}

/// What the network phases did. All zero in offline runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub offline: bool,
    pub backup_loaded: bool,
    pub repositories: EnrichmentReport,
    pub commits_from_backup: usize,
    pub commits_resolved: usize,
    pub releases_added: usize,
    pub urls_probed: usize,
}

impl ResolutionReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Report)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        modreg_fs::write_text(path, &json)?;
        tracing::info!("wrote resolution report to {}", path.display());
        Ok(())
    }

    pub fn module(&self, id: &str) -> Option<&ModuleVersionReport> {
        self.modules.get(id)
    }
}
