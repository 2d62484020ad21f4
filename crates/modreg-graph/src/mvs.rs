//! Minimum version selection.
//!
//! Starting from one or more roots, every reachable module version is
//! visited exactly once; for each module name the largest version seen wins.
//! Versions are compared as raw strings, so `"9.0.0"` beats `"10.0.0"`.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use modreg_exec::FanOut;
use modreg_model::ModuleId;

use crate::error::{MvsError, Result};
use crate::graph::{Adjacency, DepKind, DependencyGraph};
use crate::ingest::VersionIndex;

/// Module name -> selected version.
pub type Selection = BTreeMap<String, String>;

/// Selection of every root, keyed by root id.
pub type PerRootSelections = BTreeMap<ModuleId, Selection>;

/// Where a selection starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Root {
    /// The module's highest published version
    Module(String),
    Version(ModuleId),
}

impl Root {
    /// `name@version` is a version root; anything else a module name.
    pub fn parse(s: &str) -> Self {
        match ModuleId::parse(s) {
            Ok(id) => Root::Version(id),
            Err(_) => Root::Module(s.to_string()),
        }
    }

    fn resolve(&self, versions: &VersionIndex) -> std::result::Result<ModuleId, MvsError> {
        match self {
            Root::Module(name) => Ok(ModuleId::new(name, versions.highest(name)?)),
            Root::Version(id) => Ok(id.clone()),
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Module(name) => f.write_str(name),
            Root::Version(id) => write!(f, "{}", id),
        }
    }
}

impl From<ModuleId> for Root {
    fn from(id: ModuleId) -> Self {
        Root::Version(id)
    }
}

/// Select versions over `adjacency` from `roots`.
///
/// Unresolved ids are neither selected nor traversed. The roots themselves
/// are part of the selection.
pub fn select(
    roots: &[Root],
    adjacency: &Adjacency,
    versions: &VersionIndex,
    unresolved: &BTreeSet<ModuleId>,
) -> std::result::Result<Selection, MvsError> {
    let mut worklist = Vec::with_capacity(roots.len());
    for root in roots {
        worklist.push(root.resolve(versions)?);
    }

    let mut selection = Selection::new();
    let mut visited: HashSet<ModuleId> = HashSet::new();

    while let Some(id) = worklist.pop() {
        if unresolved.contains(&id) || !visited.insert(id.clone()) {
            continue;
        }

        match selection.get_mut(id.name()) {
            Some(current) if current.as_str() >= id.version() => {}
            Some(current) => *current = id.version().to_string(),
            None => {
                selection.insert(id.name().to_string(), id.version().to_string());
            }
        }

        worklist.extend(
            adjacency
                .successors(&id)
                .iter()
                .filter(|next| !visited.contains(*next))
                .cloned(),
        );
    }

    Ok(selection)
}

/// Runs selections over read-only snapshots of the regular and dev graphs.
///
/// Cheap to clone; the snapshots are shared.
#[derive(Debug, Clone)]
pub struct MvsResolver {
    regular: Arc<Adjacency>,
    dev: Arc<Adjacency>,
    versions: Arc<VersionIndex>,
    unresolved: Arc<BTreeSet<ModuleId>>,
    known: Arc<HashSet<ModuleId>>,
}

impl MvsResolver {
    pub fn new(
        graph: &DependencyGraph,
        versions: VersionIndex,
        unresolved: BTreeSet<ModuleId>,
        known: HashSet<ModuleId>,
    ) -> Self {
        Self {
            regular: Arc::new(graph.regular().adjacency()),
            dev: Arc::new(graph.dev().adjacency()),
            versions: Arc::new(versions),
            unresolved: Arc::new(unresolved),
            known: Arc::new(known),
        }
    }

    /// Selection for `roots` over the `kind` graph.
    ///
    /// The merged combination has no defined semantics yet and always
    /// selects nothing.
    pub fn select(&self, kind: DepKind, roots: &[Root]) -> std::result::Result<Selection, MvsError> {
        let adjacency = match kind {
            DepKind::Regular => &self.regular,
            DepKind::Dev => &self.dev,
            DepKind::Merged => return Ok(Selection::new()),
        };
        select(roots, adjacency, &self.versions, &self.unresolved)
    }

    /// Module versions eligible as roots: known records that are not
    /// unresolved. Sorted.
    pub fn roots(&self) -> Vec<ModuleId> {
        let mut roots: Vec<ModuleId> = self
            .regular
            .vertices()
            .filter(|id| self.known.contains(*id) && !self.unresolved.contains(*id))
            .cloned()
            .collect();
        roots.sort();
        roots
    }

    /// One selection per eligible root, computed on the bounded pool.
    pub async fn resolve_per_root(&self, kind: DepKind, pool: &FanOut) -> Result<PerRootSelections> {
        if kind == DepKind::Merged {
            tracing::debug!("merged selection is unspecified; skipping");
            return Ok(PerRootSelections::new());
        }

        let roots = self.roots();
        tracing::info!(
            roots = roots.len(),
            workers = pool.workers_for(roots.len()),
            ?kind,
            "resolving selections"
        );

        let resolver = self.clone();
        let results = pool
            .run_blocking(roots, move |root| {
                let selection = resolver.select(kind, &[Root::Version(root.clone())]);
                (root, selection)
            })
            .await?;

        let mut out = PerRootSelections::new();
        for (root, selection) in results {
            out.insert(root, selection?);
        }
        Ok(out)
    }

    /// Selection rooted at every module with metadata, each at its highest
    /// version.
    pub fn resolve_registry(&self, kind: DepKind) -> Result<Selection> {
        let roots: Vec<Root> = self
            .versions
            .modules()
            .into_iter()
            .filter(|name| {
                self.versions
                    .versions(name)
                    .is_some_and(|v| !v.is_empty())
            })
            .map(|name| Root::Module(name.to_string()))
            .collect();
        Ok(self.select(kind, &roots)?)
    }
}
