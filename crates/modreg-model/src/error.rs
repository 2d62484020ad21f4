//! Error types for modreg-model

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid module version id '{id}': expected name@version")]
    InvalidModuleId { id: String },

    #[error("Unrecognized repository reference: {reference}")]
    InvalidRepository { reference: String },

    #[error("Failed to decode registry: {0}")]
    Decode(#[from] serde_json::Error),
}
