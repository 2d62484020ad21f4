//! Directed graphs over module version ids.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use modreg_model::ModuleId;

use crate::error::GraphError;

/// Which dependency declarations a graph or selection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    Regular,
    Dev,
    /// Union of regular and dev
    Merged,
}

/// A directed graph whose vertices are module version ids.
///
/// Edges point from depender to dependee. Inserting an existing vertex or
/// edge is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    graph: DiGraph<ModuleId, ()>,
    index: HashMap<ModuleId, NodeIndex>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Returns `true` if it was not present before.
    pub fn add_vertex(&mut self, id: &ModuleId) -> Result<bool, GraphError> {
        if self.node(id)?.is_some() {
            return Ok(false);
        }
        let ix = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), ix);
        Ok(true)
    }

    /// Add the edge `from -> to`. Both vertices must already exist.
    /// Returns `true` if the edge was not present before.
    pub fn add_edge(&mut self, from: &ModuleId, to: &ModuleId) -> Result<bool, GraphError> {
        let missing = |id: &ModuleId| GraphError::VertexNotFound {
            from: from.clone(),
            to: to.clone(),
            missing: id.clone(),
        };
        let a = self.node(from)?.ok_or_else(|| missing(from))?;
        let b = self.node(to)?.ok_or_else(|| missing(to))?;
        if self.graph.find_edge(a, b).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(a, b, ());
        Ok(true)
    }

    fn node(&self, id: &ModuleId) -> Result<Option<NodeIndex>, GraphError> {
        let Some(&ix) = self.index.get(id) else {
            return Ok(None);
        };
        match self.graph.node_weight(ix) {
            Some(held) if held == id => Ok(Some(ix)),
            held => Err(GraphError::IndexMismatch {
                id: id.clone(),
                found: held.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_vertex(&self, id: &ModuleId) -> bool {
        self.index.contains_key(id)
    }

    pub fn contains_edge(&self, from: &ModuleId, to: &ModuleId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = &ModuleId> {
        self.graph.node_weights()
    }

    /// Direct dependees of `id`, in no particular order.
    pub fn successors(&self, id: &ModuleId) -> Vec<&ModuleId> {
        let Some(&ix) = self.index.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(ix, Direction::Outgoing)
            .map(|n| &self.graph[n])
            .collect()
    }

    /// Read-only adjacency snapshot with sorted successor lists.
    pub fn adjacency(&self) -> Adjacency {
        let edges = self
            .graph
            .node_indices()
            .map(|ix| {
                let mut next: Vec<ModuleId> = self
                    .graph
                    .neighbors_directed(ix, Direction::Outgoing)
                    .map(|n| self.graph[n].clone())
                    .collect();
                next.sort();
                (self.graph[ix].clone(), next)
            })
            .collect();
        Adjacency { edges }
    }

    pub(crate) fn inner(&self) -> &DiGraph<ModuleId, ()> {
        &self.graph
    }
}

/// Immutable vertex -> successors map, shared across worker threads during
/// selection.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    edges: HashMap<ModuleId, Vec<ModuleId>>,
}

impl Adjacency {
    pub fn successors(&self, id: &ModuleId) -> &[ModuleId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &ModuleId> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// The regular graph, the dev graph and their union.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    regular: DepGraph,
    dev: DepGraph,
    merged: DepGraph,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module version in all three graphs.
    pub fn add_module(&mut self, id: &ModuleId) -> Result<(), GraphError> {
        self.regular.add_vertex(id)?;
        self.dev.add_vertex(id)?;
        self.merged.add_vertex(id)?;
        Ok(())
    }

    /// Record `from -> to` in the regular or dev graph and in the union.
    pub fn add_dependency(&mut self, from: &ModuleId, to: &ModuleId, dev: bool) -> Result<(), GraphError> {
        self.add_module(from)?;
        self.add_module(to)?;
        if dev {
            self.dev.add_edge(from, to)?;
        } else {
            self.regular.add_edge(from, to)?;
        }
        self.merged.add_edge(from, to)?;
        Ok(())
    }

    pub fn graph(&self, kind: DepKind) -> &DepGraph {
        match kind {
            DepKind::Regular => &self.regular,
            DepKind::Dev => &self.dev,
            DepKind::Merged => &self.merged,
        }
    }

    pub fn regular(&self) -> &DepGraph {
        &self.regular
    }

    pub fn dev(&self) -> &DepGraph {
        &self.dev
    }

    pub fn merged(&self) -> &DepGraph {
        &self.merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> ModuleId {
        ModuleId::parse(s).unwrap()
    }

    #[test]
    fn test_add_vertex_idempotent() {
        let mut g = DepGraph::new();
        assert!(g.add_vertex(&id("a@1")).unwrap());
        assert!(!g.add_vertex(&id("a@1")).unwrap());
        assert_eq!(g.vertex_count(), 1);
    }

    #[test]
    fn test_add_edge_idempotent() {
        let mut g = DepGraph::new();
        g.add_vertex(&id("a@1")).unwrap();
        g.add_vertex(&id("b@1")).unwrap();

        assert!(g.add_edge(&id("a@1"), &id("b@1")).unwrap());
        assert!(!g.add_edge(&id("a@1"), &id("b@1")).unwrap());

        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.contains_edge(&id("a@1"), &id("b@1")));
        assert!(!g.contains_edge(&id("b@1"), &id("a@1")));
    }

    #[test]
    fn test_edge_to_missing_vertex_is_invariant_violation() {
        let mut g = DepGraph::new();
        g.add_vertex(&id("a@1")).unwrap();

        let err = g.add_edge(&id("a@1"), &id("ghost@1")).unwrap_err();
        assert!(matches!(err, GraphError::VertexNotFound { ref missing, .. } if missing.as_str() == "ghost@1"));
    }

    #[test]
    fn test_adjacency_sorted() {
        let mut g = DepGraph::new();
        for v in ["a@1", "c@1", "b@1"] {
            g.add_vertex(&id(v)).unwrap();
        }
        g.add_edge(&id("a@1"), &id("c@1")).unwrap();
        g.add_edge(&id("a@1"), &id("b@1")).unwrap();

        let adj = g.adjacency();
        assert_eq!(adj.successors(&id("a@1")), &[id("b@1"), id("c@1")]);
        assert!(adj.successors(&id("c@1")).is_empty());
        assert!(adj.successors(&id("zzz@1")).is_empty());
        assert_eq!(adj.len(), 3);
    }

    #[test]
    fn test_dependency_graph_kinds() {
        let mut g = DependencyGraph::new();
        g.add_dependency(&id("a@1"), &id("b@1"), false).unwrap();
        g.add_dependency(&id("a@1"), &id("t@1"), true).unwrap();

        assert!(g.regular().contains_edge(&id("a@1"), &id("b@1")));
        assert!(!g.regular().contains_edge(&id("a@1"), &id("t@1")));
        assert!(g.dev().contains_edge(&id("a@1"), &id("t@1")));
        assert_eq!(g.merged().edge_count(), 2);
        // Every graph knows every vertex.
        assert_eq!(g.graph(DepKind::Dev).vertex_count(), 3);
    }
}
