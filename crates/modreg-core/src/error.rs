//! Error types for modreg-core

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode resolution report: {0}")]
    Report(#[source] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] modreg_fs::Error),

    #[error(transparent)]
    Model(#[from] modreg_model::Error),

    /// Graph invariant violations and selection failures abort the run
    #[error(transparent)]
    Graph(#[from] modreg_graph::Error),

    #[error(transparent)]
    Exec(#[from] modreg_exec::Error),

    #[error(transparent)]
    Enrich(#[from] modreg_enrich::Error),
}

impl From<modreg_graph::GraphError> for Error {
    fn from(e: modreg_graph::GraphError) -> Self {
        Error::Graph(e.into())
    }
}

impl From<modreg_graph::MvsError> for Error {
    fn from(e: modreg_graph::MvsError) -> Self {
        Error::Graph(e.into())
    }
}
