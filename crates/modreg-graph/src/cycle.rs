//! Cycle detection over the merged graph.
//!
//! Every strongly connected component with two or more members is a cycle.
//! Its name is derived from the sorted member ids, so the result does not
//! depend on insertion order.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use serde::Serialize;

use modreg_model::ModuleId;

use crate::graph::DepGraph;

/// A set of mutually reachable module versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub name: String,
    /// Sorted
    pub members: Vec<ModuleId>,
}

/// Cycles of a graph and the member -> cycle lookup.
///
/// Each id belongs to at most one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleMap {
    cycles: Vec<Cycle>,
    by_member: HashMap<ModuleId, usize>,
}

impl CycleMap {
    /// Cycles sorted by name.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn cycle_of(&self, id: &ModuleId) -> Option<&Cycle> {
        self.by_member.get(id).map(|&i| &self.cycles[i])
    }

    pub fn cycle_name_of(&self, id: &ModuleId) -> Option<&str> {
        self.cycle_of(id).map(|c| c.name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.cycles.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Name of a cycle from its sorted members: `@` becomes `-`, members are
/// joined with `+`.
pub fn cycle_name(sorted_members: &[ModuleId]) -> String {
    sorted_members
        .iter()
        .map(ModuleId::cycle_segment)
        .collect::<Vec<_>>()
        .join("+")
}

pub fn detect_cycles(graph: &DepGraph) -> CycleMap {
    let inner = graph.inner();

    let mut cycles: Vec<Cycle> = tarjan_scc(inner)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<ModuleId> =
                component.into_iter().map(|ix| inner[ix].clone()).collect();
            members.sort();
            Cycle {
                name: cycle_name(&members),
                members,
            }
        })
        .collect();
    cycles.sort_by(|a, b| a.name.cmp(&b.name));

    let mut by_member = HashMap::new();
    for (i, cycle) in cycles.iter().enumerate() {
        for member in &cycle.members {
            by_member.insert(member.clone(), i);
        }
    }

    if !cycles.is_empty() {
        tracing::info!("detected {} dependency cycles", cycles.len());
    }
    for cycle in &cycles {
        tracing::debug!(cycle = %cycle.name, members = cycle.members.len(), "cycle");
    }

    CycleMap { cycles, by_member }
}
