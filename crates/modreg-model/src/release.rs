//! Release history records

use serde::{Deserialize, Serialize};

use crate::module::ModuleCommit;

/// A published release of a tracked repository, keyed by its version tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    /// Source tarball of the tagged tree
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<ModuleCommit>,
}
