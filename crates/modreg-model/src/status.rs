//! URL liveness results

use serde::{Deserialize, Serialize};

/// Outcome of probing a URL.
///
/// `code` is the final HTTP status, or 0 when the request itself failed, in
/// which case `message` carries the transport error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlStatus {
    pub url: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl UrlStatus {
    pub fn new(url: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            code,
            message: message.into(),
        }
    }

    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(url, 0, message)
    }

    /// The resource exists when the probe ended in a 2xx status.
    pub fn exists(&self) -> bool {
        (200..300).contains(&self.code)
    }
}
