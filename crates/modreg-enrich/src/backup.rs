//! Backup registry snapshot
//!
//! A previous full registry export, fetched once per run. It answers
//! repository metadata and module source lookups without touching the
//! hosting providers.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use modreg_model::{ModuleId, ModuleSource, Registry, RepositoryMetadata};

use crate::error::{Error, Result};
use crate::http;

#[derive(Debug, Clone, Default)]
pub struct BackupRegistry {
    repositories: HashMap<String, RepositoryMetadata>,
    sources: HashMap<ModuleId, ModuleSource>,
}

impl BackupRegistry {
    pub fn from_registry(registry: &Registry) -> Self {
        let mut backup = Self::default();
        for module in &registry.modules {
            if let Some(md) = &module.repository_metadata {
                backup.add_repository(md);
            }
            for version in &module.versions {
                if let Some(md) = &version.repository_metadata {
                    backup.add_repository(md);
                }
                if let Some(source) = &version.source {
                    backup.sources.insert(version.id(), source.clone());
                }
            }
        }
        backup
    }

    fn add_repository(&mut self, md: &RepositoryMetadata) {
        self.repositories
            .entry(md.identity())
            .and_modify(|existing| existing.absorb(md))
            .or_insert_with(|| md.clone());
    }

    /// Decode a snapshot; `url` ending in `.gz` means gzip-compressed.
    pub fn decode(url: &str, body: &[u8]) -> Result<Self> {
        let registry = if url.ends_with(".gz") {
            let mut json = Vec::new();
            GzDecoder::new(body)
                .read_to_end(&mut json)
                .map_err(|source| Error::Decompress {
                    url: url.to_string(),
                    source,
                })?;
            Registry::from_json(&json)?
        } else {
            Registry::from_json(body)?
        };
        Ok(Self::from_registry(&registry))
    }

    pub async fn fetch(url: &str, timeout: Duration) -> Result<Self> {
        let client = http::client(timeout)?;
        let body = http::fetch_bytes(client.get(url), url).await?;
        Self::decode(url, &body)
    }

    /// Fetch the snapshot, or `None` when it is unavailable. Never fails.
    pub async fn load(url: &str, timeout: Duration) -> Option<Self> {
        match Self::fetch(url, timeout).await {
            Ok(backup) => {
                tracing::info!(
                    "backup registry {}: {} repositories, {} module sources",
                    url,
                    backup.repositories.len(),
                    backup.sources.len()
                );
                Some(backup)
            }
            Err(e) => {
                tracing::warn!("backup registry {} unavailable: {}", url, e);
                None
            }
        }
    }

    pub fn repository(&self, identity: &str) -> Option<&RepositoryMetadata> {
        self.repositories.get(identity)
    }

    pub fn module_source(&self, id: &ModuleId) -> Option<&ModuleSource> {
        self.sources.get(id)
    }

    /// Commit sha the snapshot recorded for `id`.
    pub fn commit_sha(&self, id: &ModuleId) -> Option<&str> {
        self.module_source(id)?
            .commit_sha
            .as_deref()
            .filter(|sha| !sha.is_empty())
    }

    /// Copy backed-up fields into every unfetched record. Returns how many
    /// records are fetched afterwards.
    pub fn populate(&self, records: &mut [RepositoryMetadata]) -> usize {
        let mut filled = 0;
        for record in records.iter_mut().filter(|r| !r.is_fetched()) {
            let Some(found) = self.repository(&record.identity()) else {
                continue;
            };
            if found.is_fetched() && record.languages.is_none() {
                record.languages = Some(BTreeMap::new());
            }
            record.absorb(found);
            if record.is_fetched() {
                filled += 1;
            }
        }
        filled
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty() && self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modreg_model::RepositoryType;
    use modreg_test_utils::RegistryBuilder;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn fetched(org: &str, name: &str, description: &str) -> RepositoryMetadata {
        let mut md = RepositoryMetadata::new(RepositoryType::Github, org, name);
        md.description = description.to_string();
        md.stargazers = 42;
        md.set_languages(BTreeMap::from([("C".to_string(), 1000)]));
        md
    }

    fn snapshot() -> Registry {
        RegistryBuilder::new()
            .version("zlib", "1.3.1", &[])
            .source_with_commit("zlib", "1.3.1", "https://example.com/zlib.tar.gz", "abc123")
            .repository_metadata("zlib", fetched("madler", "zlib", "compression"))
            .build()
    }

    #[test]
    fn test_populate_fills_unfetched_only() {
        let backup = BackupRegistry::from_registry(&snapshot());
        let mut records = vec![
            RepositoryMetadata::new(RepositoryType::Github, "madler", "zlib"),
            RepositoryMetadata::new(RepositoryType::Github, "google", "re2"),
        ];

        assert_eq!(backup.populate(&mut records), 1);
        assert_eq!(records[0].description, "compression");
        assert_eq!(records[0].stargazers, 42);
        assert_eq!(records[0].primary_language.as_deref(), Some("C"));
        assert!(!records[1].is_fetched());
    }

    #[test]
    fn test_empty_language_map_counts_as_fetched() {
        let mut md = RepositoryMetadata::new(RepositoryType::Github, "bazelbuild", "docs");
        md.set_languages(BTreeMap::new());
        let registry = RegistryBuilder::new()
            .version("docs", "1", &[])
            .repository_metadata("docs", md)
            .build();
        let backup = BackupRegistry::from_registry(&registry);

        let mut records = vec![RepositoryMetadata::new(RepositoryType::Github, "bazelbuild", "docs")];
        assert_eq!(backup.populate(&mut records), 1);
        assert_eq!(records[0].languages, Some(BTreeMap::new()));
    }

    #[test]
    fn test_module_source_commit() {
        let backup = BackupRegistry::from_registry(&snapshot());
        let id = ModuleId::new("zlib", "1.3.1");
        assert_eq!(backup.commit_sha(&id), Some("abc123"));
        assert_eq!(backup.commit_sha(&ModuleId::new("zlib", "1.2.13")), None);
    }

    #[test]
    fn test_decode_gzip() {
        let json = serde_json::to_vec(&snapshot()).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&json).unwrap();
        let gz = encoder.finish().unwrap();

        let backup = BackupRegistry::decode("https://example.com/registry.json.gz", &gz).unwrap();
        assert!(backup.repository("github:madler/zlib").is_some());

        let plain = BackupRegistry::decode("https://example.com/registry.json", &json).unwrap();
        assert_eq!(plain.len(), 1);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(BackupRegistry::decode("https://example.com/registry.json.gz", b"nope").is_err());
        assert!(BackupRegistry::decode("https://example.com/registry.json", b"nope").is_err());
    }
}
