//! Generic keyed record cache backed by one JSON file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::CacheRecord;

/// When [`RecordCache::save`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Only after new data was fetched during the run
    WhenDirty,
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { records: usize },
    /// No file location configured
    NotConfigured,
    /// Nothing new to persist
    Clean,
}

#[derive(Debug, Clone)]
pub struct RecordCache<R> {
    name: &'static str,
    path: Option<PathBuf>,
    policy: SavePolicy,
    records: BTreeMap<String, R>,
    dirty: bool,
}

impl<R: CacheRecord> RecordCache<R> {
    pub fn new(name: &'static str, path: Option<PathBuf>, policy: SavePolicy) -> Self {
        Self {
            name,
            path,
            policy,
            records: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Merge the persisted collection into memory.
    ///
    /// Never fails: a missing, unreadable or undecodable file is logged and
    /// leaves the in-memory records as they were. Returns the number of
    /// records read.
    pub fn load(&mut self) -> usize {
        let Some(path) = self.path.clone() else {
            tracing::debug!("{} cache: no file configured", self.name);
            return 0;
        };
        match self.read(&path) {
            Ok(records) => {
                let count = records.len();
                for record in records {
                    self.records.insert(record.cache_key(), record);
                }
                tracing::info!("{} cache: loaded {} records from {}", self.name, count, path.display());
                count
            }
            Err(Error::Fs(modreg_fs::Error::Io { source, .. })) if source.kind() == ErrorKind::NotFound => {
                tracing::info!("{} cache: {} does not exist yet", self.name, path.display());
                0
            }
            Err(e) => {
                tracing::warn!("{} cache: failed to load {}: {}", self.name, path.display(), e);
                0
            }
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<R>> {
        let bytes = modreg_fs::read_bytes(path)?;
        let decode = |source| Error::Decode {
            cache: self.name,
            path: path.to_path_buf(),
            source,
        };
        let mut file: Map<String, Value> = serde_json::from_slice(&bytes).map_err(decode)?;
        match file.remove(R::COLLECTION) {
            Some(records) => serde_json::from_value(records).map_err(decode),
            None => Ok(Vec::new()),
        }
    }

    /// Persist according to the save policy.
    pub fn save(&self) -> Result<SaveOutcome> {
        let Some(path) = self.path.as_deref() else {
            return Ok(SaveOutcome::NotConfigured);
        };
        if self.policy == SavePolicy::WhenDirty && !self.dirty {
            tracing::debug!("{} cache: unchanged, not writing {}", self.name, path.display());
            return Ok(SaveOutcome::Clean);
        }

        let content = self.encode()?;
        modreg_fs::write_atomic(path, content.as_bytes())?;
        tracing::info!("{} cache: wrote {} records to {}", self.name, self.records.len(), path.display());
        Ok(SaveOutcome::Written {
            records: self.records.len(),
        })
    }

    fn encode(&self) -> Result<String> {
        let encode = |source| Error::Encode {
            cache: self.name,
            source,
        };
        // BTreeMap iteration is key order.
        let records: Vec<&R> = self.records.values().collect();
        let mut file = Map::new();
        file.insert(
            R::COLLECTION.to_string(),
            serde_json::to_value(records).map_err(encode)?,
        );
        serde_json::to_string_pretty(&file).map_err(encode)
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Insert or overwrite without marking the cache dirty.
    pub fn insert(&mut self, record: R) -> Option<R> {
        self.records.insert(record.cache_key(), record)
    }

    /// Insert or overwrite a record fetched during this run.
    pub fn insert_fetched(&mut self, record: R) -> Option<R> {
        self.dirty = true;
        self.insert(record)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records in key order.
    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modreg_model::UrlStatus;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_records_written_in_key_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.json");
        let mut cache = RecordCache::new("url status", Some(path.clone()), SavePolicy::Always);
        cache.insert(UrlStatus::new("https://z.example", 200, "OK"));
        cache.insert(UrlStatus::new("https://a.example", 404, "Not Found"));

        cache.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let a = text.find("https://a.example").unwrap();
        let z = text.find("https://z.example").unwrap();
        assert!(a < z);
        assert!(text.contains("\"status\""));
    }

    #[test]
    fn test_unconfigured_cache() {
        let mut cache: RecordCache<UrlStatus> = RecordCache::new("url status", None, SavePolicy::Always);
        assert_eq!(cache.load(), 0);
        cache.insert(UrlStatus::new("u", 200, ""));
        assert_eq!(cache.save().unwrap(), SaveOutcome::NotConfigured);
    }

    #[test]
    fn test_insert_fetched_sets_dirty() {
        let mut cache: RecordCache<UrlStatus> = RecordCache::new("url status", None, SavePolicy::WhenDirty);
        cache.insert(UrlStatus::new("u", 200, ""));
        assert!(!cache.is_dirty());
        cache.insert_fetched(UrlStatus::new("v", 200, ""));
        assert!(cache.is_dirty());
        assert_eq!(cache.len(), 2);
    }
}
