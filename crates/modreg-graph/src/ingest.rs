//! Building the dependency graph from a registry snapshot.

use std::collections::{BTreeSet, HashMap, HashSet};

use modreg_model::{ModuleId, Registry};

use crate::error::{GraphError, MvsError};
use crate::graph::DependencyGraph;

/// Published versions per module name, oldest first, from module metadata.
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    versions: HashMap<String, Vec<String>>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: &Registry) -> Self {
        let mut index = Self::new();
        for module in &registry.modules {
            match &module.metadata {
                Some(md) => index.insert(&module.name, md.versions.clone()),
                None => tracing::warn!("module {} has no metadata", module.name),
            }
        }
        index
    }

    pub fn insert(&mut self, module: &str, versions: Vec<String>) {
        self.versions.insert(module.to_string(), versions);
    }

    pub fn versions(&self, module: &str) -> Option<&[String]> {
        self.versions.get(module).map(Vec::as_slice)
    }

    /// The last listed version of `module`.
    pub fn highest(&self, module: &str) -> Result<&str, MvsError> {
        let versions = self.versions(module).ok_or_else(|| MvsError::UnknownModule {
            module: module.to_string(),
        })?;
        versions
            .last()
            .map(String::as_str)
            .ok_or_else(|| MvsError::EmptyVersionList {
                module: module.to_string(),
            })
    }

    /// Module names, sorted.
    pub fn modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.versions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Output of [`ingest`].
#[derive(Debug, Clone, Default)]
pub struct IngestedRegistry {
    pub graph: DependencyGraph,
    pub versions: VersionIndex,
    /// Declared dependencies with no matching record and no override
    pub unresolved: BTreeSet<ModuleId>,
    /// Every module version with a record in the registry
    pub known: HashSet<ModuleId>,
}

/// Visit every module version of `registry` and populate the graphs.
///
/// Dependencies without a version are skipped. A dependency on an unknown
/// module version is kept in the graph and flagged unresolved, unless an
/// override satisfies it, in which case no edge is recorded.
pub fn ingest(registry: &Registry) -> Result<IngestedRegistry, GraphError> {
    let known: HashSet<ModuleId> = registry.module_versions().map(|mv| mv.id()).collect();
    let mut graph = DependencyGraph::new();
    let mut unresolved = BTreeSet::new();

    for mv in registry.module_versions() {
        let from = mv.id();
        graph.add_module(&from)?;

        for dep in &mv.deps {
            let Some(to) = dep.id() else {
                tracing::debug!("{}: dependency {} has no version", from, dep.name);
                continue;
            };
            if !known.contains(&to) {
                if dep.module_override.is_some() {
                    tracing::debug!("{}: dependency {} satisfied by override", from, to);
                    continue;
                }
                tracing::warn!("{}: unresolved dependency {}", from, to);
                unresolved.insert(to.clone());
            }
            graph.add_dependency(&from, &to, dep.dev)?;
        }
    }

    tracing::info!(
        modules = registry.modules.len(),
        versions = known.len(),
        edges = graph.merged().edge_count(),
        unresolved = unresolved.len(),
        "ingested registry"
    );

    Ok(IngestedRegistry {
        graph,
        versions: VersionIndex::from_registry(registry),
        unresolved,
        known,
    })
}
