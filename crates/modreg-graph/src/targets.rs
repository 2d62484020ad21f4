//! Dependency targets.
//!
//! Translates each declared dependency into what a consumer should point at:
//! the providing module version, or the cycle aggregate when the dependee is
//! part of a cycle, which keeps the consumer-facing structure acyclic.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use modreg_model::{ModuleId, ModuleVersion};

use crate::cycle::CycleMap;

/// Maps import identifiers (`name@version` or a cycle name) to the targets
/// providing them. Targets are registered while indexing and looked up while
/// resolving; exactly one provider is expected per import.
pub trait ImportIndex {
    fn register(&mut self, import: &str, target: &str);
    fn lookup(&self, import: &str) -> Vec<String>;
}

/// In-memory [`ImportIndex`].
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    providers: HashMap<String, Vec<String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every module version and every cycle under its own name.
    pub fn for_registry<'a>(ids: impl IntoIterator<Item = &'a ModuleId>, cycles: &CycleMap) -> Self {
        let mut index = Self::new();
        for id in ids {
            index.register(id.as_str(), id.as_str());
        }
        for cycle in cycles.cycles() {
            index.register(&cycle.name, &cycle.name);
        }
        index
    }
}

impl ImportIndex for MemoryIndex {
    fn register(&mut self, import: &str, target: &str) {
        let targets = self.providers.entry(import.to_string()).or_default();
        if !targets.iter().any(|t| t == target) {
            targets.push(target.to_string());
        }
    }

    fn lookup(&self, import: &str) -> Vec<String> {
        self.providers.get(import).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum DependencyTarget {
    Module(String),
    /// The cycle aggregate containing the dependee
    Cycle(String),
    Override,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub name: String,
    pub version: String,
    pub dev: bool,
    pub target: DependencyTarget,
}

/// Resolve the targets of every dependency declared by `mv`.
pub fn resolve_dependencies(
    mv: &ModuleVersion,
    cycles: &CycleMap,
    index: &dyn ImportIndex,
    unresolved: &BTreeSet<ModuleId>,
) -> Vec<ResolvedDependency> {
    let from = mv.id();
    mv.deps
        .iter()
        .map(|dep| {
            let target = match dep.id() {
                _ if dep.module_override.is_some() => DependencyTarget::Override,
                None => {
                    tracing::warn!("{}: dependency {} is missing a version", from, dep.name);
                    DependencyTarget::Unresolved
                }
                Some(to) if unresolved.contains(&to) => DependencyTarget::Unresolved,
                Some(to) => lookup_target(&from, &to, cycles, index),
            };
            ResolvedDependency {
                name: dep.name.clone(),
                version: dep.version.clone(),
                dev: dep.dev,
                target,
            }
        })
        .collect()
}

fn lookup_target(
    from: &ModuleId,
    to: &ModuleId,
    cycles: &CycleMap,
    index: &dyn ImportIndex,
) -> DependencyTarget {
    let providers = index.lookup(to.as_str());
    let Some(provider) = providers.first() else {
        tracing::warn!("{}: no module version found for {}", from, to);
        return DependencyTarget::Unresolved;
    };
    if providers.len() > 1 {
        tracing::warn!(
            "{}: {} providers for {}, using {}",
            from,
            providers.len(),
            to,
            provider
        );
    }

    match cycles.cycle_name_of(to) {
        Some(cycle) => match index.lookup(cycle).into_iter().next() {
            Some(target) => DependencyTarget::Cycle(target),
            None => DependencyTarget::Cycle(cycle.to_string()),
        },
        None => DependencyTarget::Module(provider.clone()),
    }
}
