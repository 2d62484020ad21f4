//! Module version records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ModuleId;
use crate::repository::RepositoryMetadata;
use crate::status::UrlStatus;

/// One published version of a module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub compatibility_level: i32,
    /// Build tool versions this module version declares itself compatible with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bazel_compatibility: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub deps: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ModuleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presubmit: Option<Presubmit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestations: Option<Attestations>,
    /// Registry commit that introduced this version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<ModuleCommit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_metadata: Option<RepositoryMetadata>,
}

impl ModuleVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> ModuleId {
        ModuleId::new(&self.name, &self.version)
    }

    pub fn regular_deps(&self) -> impl Iterator<Item = &Dependency> {
        self.deps.iter().filter(|d| !d.dev)
    }

    pub fn dev_deps(&self) -> impl Iterator<Item = &Dependency> {
        self.deps.iter().filter(|d| d.dev)
    }
}

/// A declared dependency of a module version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Required version; empty when the dependency is satisfied by an override
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dev: bool,
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub module_override: Option<Override>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn dev(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dev: true,
            ..Self::new(name, version)
        }
    }

    /// The dependee id, or `None` when no version is declared.
    pub fn id(&self) -> Option<ModuleId> {
        if self.name.is_empty() || self.version.is_empty() {
            None
        } else {
            Some(ModuleId::new(&self.name, &self.version))
        }
    }
}

/// Replacement of a dependency's registry resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Override {
    Git {
        remote: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
    Archive {
        urls: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        integrity: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strip_prefix: Option<String>,
    },
    SingleVersion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        registry: Option<String>,
    },
    LocalPath {
        path: String,
    },
}

/// Where a module version's sources are downloaded from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub integrity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strip_prefix: String,
    #[serde(default)]
    pub patch_strip: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub patches: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Commit the source archive was built from, once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_status: Option<UrlStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url_status: Option<UrlStatus>,
}

impl ModuleSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn has_commit_sha(&self) -> bool {
        self.commit_sha.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presubmit {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub bazel_versions: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attestations {
    pub media_type: String,
    /// Attested file name to attestation URL
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

/// A git commit: sha, RFC 3339 date and message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleCommit {
    pub sha1: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ModuleCommit {
    pub fn timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&chrono::Utc))
    }
}
