//! Error types for modreg-cache

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] modreg_fs::Error),

    #[error("Failed to decode {cache} cache at {path}: {source}")]
    Decode {
        cache: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {cache} cache: {source}")]
    Encode {
        cache: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
