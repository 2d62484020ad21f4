//! Error types for modreg-exec

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A job panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Worker pool semaphore closed")]
    Closed,

    #[error("Result collector poisoned by a panicking job")]
    Poisoned,
}
