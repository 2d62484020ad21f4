//! Dependency resolution over a module registry
//!
//! ```text
//! Registry ──ingest──► DependencyGraph (regular, dev, merged)
//!                           │
//!              ┌────────────┼──────────────┐
//!              ▼            ▼              ▼
//!          CycleMap     MvsResolver    dependency targets
//!         (merged SCC)  (per root,     (module, cycle aggregate,
//!                        per kind)      override, unresolved)
//!                           │
//!                           ▼
//!                 Ranking + narrow_versions
//! ```
//!
//! The graph is built by a single owner before any concurrent phase; the
//! adjacency snapshots handed to the resolver are read-only.

pub mod cycle;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod mvs;
pub mod narrow;
pub mod rank;
pub mod targets;

pub use cycle::{Cycle, CycleMap, cycle_name, detect_cycles};
pub use error::{Error, GraphError, MvsError, Result};
pub use graph::{Adjacency, DepGraph, DepKind, DependencyGraph};
pub use ingest::{IngestedRegistry, VersionIndex, ingest};
pub use mvs::{MvsResolver, PerRootSelections, Root, Selection, select};
pub use narrow::narrow_versions;
pub use rank::{Ranking, without_root};
pub use targets::{
    DependencyTarget, ImportIndex, MemoryIndex, ResolvedDependency, resolve_dependencies,
};
