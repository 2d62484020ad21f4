//! Repository metadata enrichment
//!
//! ```text
//! module metadata ──► wanted identities ──► cached & fetched? ──► done
//!                                              │ no
//!                                              ▼
//!                                      backup registry hit? ──► cache (dirty)
//!                                              │ no
//!                                              ▼
//!                           per provider, batches of MAX_BATCH, retried
//!                                              │
//!                              ok ──► cache (dirty)   exhausted ──► skipped
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use modreg_cache::RepositoryMetadataCache;
use modreg_exec::{RetryPolicy, retry};
use modreg_model::{Registry, RepositoryMetadata, RepositoryType};
use serde::Serialize;

use crate::backup::BackupRegistry;
use crate::error::{Error, Result};

/// Upper bound of repositories per provider query.
pub const MAX_BATCH: usize = 100;

/// A hosting provider able to describe many repositories in one request.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    fn kind(&self) -> RepositoryType;

    /// Fetch up to [`MAX_BATCH`] repositories. Returns a fetched copy of
    /// each repository the provider knows; unknown ones are absent.
    async fn fetch_batch(&self, batch: &[RepositoryMetadata]) -> Result<Vec<RepositoryMetadata>>;
}

/// Counters of one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Already fetched in the cache
    pub cached: usize,
    pub from_backup: usize,
    pub fetched: usize,
    /// Requested but unknown to the provider
    pub not_found: usize,
    /// Repositories of batches that exhausted their retries
    pub failed: usize,
    pub failed_batches: usize,
    /// Configured skips, unknown providers and providers without a source
    pub skipped: usize,
}

pub struct RepositoryEnricher {
    sources: Vec<Arc<dyn RepositorySource>>,
    retry: RetryPolicy,
    skip: BTreeSet<String>,
}

impl RepositoryEnricher {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            sources: Vec::new(),
            retry,
            skip: BTreeSet::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn RepositorySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Identities never fetched.
    pub fn skip<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(identities.into_iter().map(Into::into));
        self
    }

    /// Every repository referenced by module metadata, keyed by identity.
    pub fn wanted(registry: &Registry) -> BTreeMap<String, RepositoryMetadata> {
        registry
            .modules
            .iter()
            .filter_map(|m| m.metadata.as_ref())
            .flat_map(|md| md.repository.iter())
            .filter_map(|reference| {
                let parsed = RepositoryMetadata::parse(reference);
                if parsed.is_none() {
                    tracing::debug!("unrecognized repository reference {}", reference);
                }
                parsed
            })
            .map(|md| (md.identity(), md))
            .collect()
    }

    /// Fill `cache` with metadata for every repository the registry
    /// references. Existing fetched records are never overwritten and a
    /// failed batch leaves its repositories as they were.
    pub async fn enrich(
        &self,
        registry: &Registry,
        cache: &mut RepositoryMetadataCache,
        backup: Option<&BackupRegistry>,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        let mut pending = Vec::new();
        for (identity, skeleton) in Self::wanted(registry) {
            if self.skip.contains(&identity) {
                tracing::debug!("{}: skipped by configuration", identity);
                report.skipped += 1;
                continue;
            }
            match cache.get(&identity) {
                Some(cached) if cached.is_fetched() => report.cached += 1,
                Some(cached) => pending.push(cached.clone()),
                None => pending.push(skeleton),
            }
        }

        if let Some(backup) = backup {
            report.from_backup = backup.populate(&mut pending);
            for record in pending.iter().filter(|r| r.is_fetched()) {
                cache.insert_fetched(record.clone());
            }
            pending.retain(|r| !r.is_fetched());
        }

        let mut by_kind: BTreeMap<RepositoryType, Vec<RepositoryMetadata>> = BTreeMap::new();
        for record in pending {
            by_kind.entry(record.kind).or_default().push(record);
        }

        for (kind, records) in by_kind {
            let Some(source) = self.sources.iter().find(|s| s.kind() == kind) else {
                tracing::debug!("{} {} repositories: no metadata source", records.len(), kind);
                report.skipped += records.len();
                continue;
            };
            self.fetch_all(source.as_ref(), &records, cache, &mut report).await;
        }

        tracing::info!(
            "repository metadata: {} cached, {} from backup, {} fetched, {} not found, {} failed",
            report.cached,
            report.from_backup,
            report.fetched,
            report.not_found,
            report.failed
        );
        report
    }

    async fn fetch_all(
        &self,
        source: &dyn RepositorySource,
        records: &[RepositoryMetadata],
        cache: &mut RepositoryMetadataCache,
        report: &mut EnrichmentReport,
    ) {
        let total = records.len().div_ceil(MAX_BATCH);
        for (n, batch) in records.chunks(MAX_BATCH).enumerate() {
            let label = format!("{} batch {}/{}", source.kind(), n + 1, total);
            let result = retry(self.retry, &label, || async move {
                source.fetch_batch(batch).await.map_err(Error::into_backoff)
            })
            .await;

            match result {
                Ok(fetched) => {
                    report.not_found += batch.len().saturating_sub(fetched.len());
                    report.fetched += fetched.len();
                    for record in fetched {
                        cache.insert_fetched(record);
                    }
                }
                Err(e) => {
                    tracing::warn!("{}: skipping {} repositories: {}", label, batch.len(), e);
                    report.failed += batch.len();
                    report.failed_batches += 1;
                }
            }
        }
    }
}
