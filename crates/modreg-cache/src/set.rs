//! The three run caches, loaded and saved together.

use std::path::PathBuf;

use modreg_model::{Release, RepositoryMetadata, UrlStatus};

use crate::cache::{RecordCache, SaveOutcome, SavePolicy};
use crate::error::Result;

/// File locations; `None` disables caching for that category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachePaths {
    pub releases: Option<PathBuf>,
    pub repository_metadata: Option<PathBuf>,
    pub url_status: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Caches {
    pub releases: RecordCache<Release>,
    pub repositories: RecordCache<RepositoryMetadata>,
    pub url_status: RecordCache<UrlStatus>,
}

impl Caches {
    /// Empty caches bound to `paths`, without reading anything.
    pub fn new(paths: &CachePaths) -> Self {
        Self {
            releases: RecordCache::new("release", paths.releases.clone(), SavePolicy::WhenDirty),
            repositories: RecordCache::new(
                "repository metadata",
                paths.repository_metadata.clone(),
                SavePolicy::WhenDirty,
            ),
            url_status: RecordCache::new("url status", paths.url_status.clone(), SavePolicy::Always),
        }
    }

    /// Bind to `paths` and load whatever is persisted there.
    pub fn load(paths: &CachePaths) -> Self {
        let mut caches = Self::new(paths);
        caches.releases.load();
        caches.repositories.load();
        caches.url_status.load();
        caches
    }

    /// Save every cache. A failure of one does not stop the others.
    pub fn save_all(&self) -> CacheSaveReport {
        let results = vec![
            (self.releases.name(), self.releases.save()),
            (self.repositories.name(), self.repositories.save()),
            (self.url_status.name(), self.url_status.save()),
        ];
        for (name, result) in &results {
            if let Err(e) = result {
                tracing::error!("{} cache: save failed: {}", name, e);
            }
        }
        CacheSaveReport { results }
    }
}

/// Per-cache outcome of [`Caches::save_all`].
#[derive(Debug)]
pub struct CacheSaveReport {
    pub results: Vec<(&'static str, Result<SaveOutcome>)>,
}

impl CacheSaveReport {
    pub fn is_ok(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &crate::Error)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (*name, e)))
    }

    pub fn outcome(&self, cache: &str) -> Option<&Result<SaveOutcome>> {
        self.results
            .iter()
            .find(|(name, _)| *name == cache)
            .map(|(_, r)| r)
    }
}
