//! Error types for modreg-graph

use modreg_model::ModuleId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Internal graph invariant broken; aborts the run
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Mvs(#[from] MvsError),

    #[error(transparent)]
    Exec(#[from] modreg_exec::Error),
}

/// Graph operations fail only when the graph's own bookkeeping is wrong.
/// Re-inserting an existing vertex or edge is not an error.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph invariant violated: edge {from} -> {to} references missing vertex {missing}")]
    VertexNotFound {
        from: ModuleId,
        to: ModuleId,
        missing: ModuleId,
    },

    #[error("graph invariant violated: index for {id} points at node holding {found}")]
    IndexMismatch { id: ModuleId, found: String },
}

#[derive(Debug, thiserror::Error)]
pub enum MvsError {
    /// A bare-name root whose metadata lists no versions
    #[error("module {module} has no published versions to select from")]
    EmptyVersionList { module: String },

    #[error("module {module} has no metadata")]
    UnknownModule { module: String },
}
