//! Registry snapshot

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::ModuleId;
use crate::metadata::ModuleMetadata;
use crate::module::{ModuleSource, ModuleVersion};
use crate::repository::RepositoryMetadata;

/// Every module of a registry, as produced by the registry parser.
///
/// The same shape serves as resolver input and as the backup registry
/// export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// A module and all of its published versions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModuleMetadata>,
    #[serde(default)]
    pub versions: Vec<ModuleVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_metadata: Option<RepositoryMetadata>,
}

impl Registry {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_version(&self, id: &ModuleId) -> Option<&ModuleVersion> {
        self.module(id.name())?
            .versions
            .iter()
            .find(|v| v.version == id.version())
    }

    pub fn module_versions(&self) -> impl Iterator<Item = &ModuleVersion> {
        self.modules.iter().flat_map(|m| m.versions.iter())
    }

    pub fn module_versions_mut(&mut self) -> impl Iterator<Item = &mut ModuleVersion> {
        self.modules.iter_mut().flat_map(|m| m.versions.iter_mut())
    }

    /// Source of one module version, if recorded.
    pub fn module_source(&self, name: &str, version: &str) -> Option<&ModuleSource> {
        self.module(name)?
            .versions
            .iter()
            .find(|v| v.version == version)?
            .source
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"{
        "modules": [
            {
                "name": "zlib",
                "metadata": {"repository": ["github:madler/zlib"], "versions": ["1.2.13", "1.3.1"]},
                "versions": [
                    {"name": "zlib", "version": "1.2.13"},
                    {"name": "zlib", "version": "1.3.1",
                     "source": {"url": "https://github.com/madler/zlib/archive/refs/tags/v1.3.1.tar.gz",
                                "commit_sha": "51b7f2abdade71cd9bb0e7a373ef2610ec6f9daf"}}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_decode_and_lookup() {
        let registry = Registry::from_json(SNAPSHOT.as_bytes()).unwrap();

        assert_eq!(registry.module_versions().count(), 2);
        let mv = registry.module_version(&ModuleId::new("zlib", "1.3.1")).unwrap();
        assert_eq!(mv.deps.len(), 0);
        assert_eq!(
            registry.module_source("zlib", "1.3.1").unwrap().commit_sha.as_deref(),
            Some("51b7f2abdade71cd9bb0e7a373ef2610ec6f9daf")
        );
        assert!(registry.module_source("zlib", "1.2.13").is_none());
        assert!(registry.module("absent").is_none());
    }

    #[test]
    fn test_decode_error() {
        assert!(Registry::from_json(b"{\"modules\": 3}").is_err());
    }
}
