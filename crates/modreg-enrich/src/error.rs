//! Error types for modreg-enrich

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decompress {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GraphQL query to {url} failed: {messages}")]
    GraphQl { url: String, messages: String },

    #[error("batch of {size} repositories exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("{repository}: cannot resolve {reference} to a commit")]
    UnresolvedReference { repository: String, reference: String },

    #[error(transparent)]
    Model(#[from] modreg_model::Error),

    #[error(transparent)]
    Exec(#[from] modreg_exec::Error),
}

impl Error {
    /// A 404 from the upstream API. Retrying will not help.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status: 404, .. })
    }

    /// Classify for [`modreg_exec::retry`].
    pub(crate) fn into_backoff(self) -> backoff::Error<Self> {
        if self.is_not_found() {
            backoff::Error::permanent(self)
        } else {
            backoff::Error::transient(self)
        }
    }
}
