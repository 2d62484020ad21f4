//! [`RegistryBuilder`] for resolver test scenarios.

use std::path::PathBuf;

use modreg_model::{
    Dependency, Module, ModuleMetadata, ModuleSource, ModuleVersion, Registry,
    RepositoryMetadata,
};
use tempfile::TempDir;

/// Builds a registry snapshot. Versions are appended to the module's
/// metadata version list in call order, so call oldest first.
///
/// # Example
///
/// ```rust
/// use modreg_test_utils::RegistryBuilder;
///
/// let registry = RegistryBuilder::new()
///     .version("app", "1.0", &[("lib", "2.0")])
///     .version("lib", "2.0", &[])
///     .repository("lib", "github:example/lib")
///     .build();
/// assert_eq!(registry.modules.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn module_mut(&mut self, name: &str) -> &mut Module {
        let pos = match self.registry.modules.iter().position(|m| m.name == name) {
            Some(pos) => pos,
            None => {
                self.registry.modules.push(Module {
                    name: name.to_string(),
                    metadata: Some(ModuleMetadata::default()),
                    ..Default::default()
                });
                self.registry.modules.len() - 1
            }
        };
        &mut self.registry.modules[pos]
    }

    fn version_mut(&mut self, name: &str, version: &str) -> &mut ModuleVersion {
        let module = self.module_mut(name);
        let pos = module
            .versions
            .iter()
            .position(|v| v.version == version)
            .unwrap_or_else(|| panic!("{}@{} not declared; call version() first", name, version));
        &mut module.versions[pos]
    }

    /// Add `name@version` with regular dependencies `deps`.
    pub fn version(mut self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        let module = self.module_mut(name);
        let mut mv = ModuleVersion::new(name, version);
        mv.deps = deps.iter().map(|(n, v)| Dependency::new(*n, *v)).collect();
        module.versions.push(mv);
        if let Some(md) = module.metadata.as_mut() {
            md.versions.push(version.to_string());
        }
        self
    }

    /// Add a dev dependency to an already declared version.
    pub fn dev_dep(mut self, name: &str, version: &str, dep: &str, dep_version: &str) -> Self {
        self.version_mut(name, version)
            .deps
            .push(Dependency::dev(dep, dep_version));
        self
    }

    /// Add a repository reference to a module's metadata.
    pub fn repository(mut self, name: &str, reference: &str) -> Self {
        if let Some(md) = self.module_mut(name).metadata.as_mut() {
            md.repository.push(reference.to_string());
        }
        self
    }

    /// Set the source URL of an already declared version.
    pub fn source(mut self, name: &str, version: &str, url: &str) -> Self {
        self.version_mut(name, version).source = Some(ModuleSource::new(url));
        self
    }

    /// Set a source URL with an already known commit.
    pub fn source_with_commit(mut self, name: &str, version: &str, url: &str, sha: &str) -> Self {
        let mut source = ModuleSource::new(url);
        source.commit_sha = Some(sha.to_string());
        self.version_mut(name, version).source = Some(source);
        self
    }

    /// Set the docs URL of an already declared version's source.
    pub fn docs_url(mut self, name: &str, version: &str, url: &str) -> Self {
        let mv = self.version_mut(name, version);
        mv.source.get_or_insert_with(ModuleSource::default).docs_url = Some(url.to_string());
        self
    }

    /// Attach enriched repository metadata to a module.
    pub fn repository_metadata(mut self, name: &str, md: RepositoryMetadata) -> Self {
        self.module_mut(name).repository_metadata = Some(md);
        self
    }

    /// Drop a module's metadata record.
    pub fn without_metadata(mut self, name: &str) -> Self {
        self.module_mut(name).metadata = None;
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}

/// Write `registry` as JSON into a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the file is needed.
pub fn write_registry(registry: &Registry) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    std::fs::write(&path, serde_json::to_vec_pretty(registry).unwrap()).unwrap();
    (dir, path)
}
