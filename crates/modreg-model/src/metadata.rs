//! Per-module metadata

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata shared by every version of one module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    /// Repository references such as `github:org/name`
    #[serde(default)]
    pub repository: Vec<String>,
    /// Published versions, oldest first. The last entry is the highest version.
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub yanked_versions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl ModuleMetadata {
    pub fn with_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    pub fn is_latest(&self, version: &str) -> bool {
        self.latest_version() == Some(version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Maintainer {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_is_last_entry() {
        let md = ModuleMetadata::with_versions(["1.0.0", "10.0.0", "9.0.0"]);
        assert_eq!(md.latest_version(), Some("9.0.0"));
        assert!(md.is_latest("9.0.0"));
        assert!(!md.is_latest("10.0.0"));
    }

    #[test]
    fn test_empty_versions_has_no_latest() {
        assert_eq!(ModuleMetadata::default().latest_version(), None);
    }
}
