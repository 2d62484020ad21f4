//! Commit resolution for module sources
//!
//! Source URLs are classified first; only GitHub tag archives, commit
//! archives and release assets are resolvable. Each distinct URL is resolved
//! once, however many module versions share it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use modreg_exec::{FanOut, RetryPolicy, retry};
use modreg_model::ModuleId;

use crate::error::{Error, Result};
use crate::source_url::{SourceUrl, SourceUrlKind};

/// Turns tags and releases into commit shas.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn tag_commit(&self, org: &str, repo: &str, tag: &str) -> Result<String>;

    async fn release_commit(&self, org: &str, repo: &str, version: &str) -> Result<String>;
}

/// Commit of one classified source URL.
pub async fn resolve_commit(source: &dyn CommitSource, url: &SourceUrl) -> Result<String> {
    match url.kind {
        SourceUrlKind::Commit => Ok(url.reference.clone()),
        SourceUrlKind::Tag => {
            source
                .tag_commit(&url.organization, &url.repository, &url.reference)
                .await
        }
        SourceUrlKind::Release => {
            source
                .release_commit(&url.organization, &url.repository, &url.reference)
                .await
        }
    }
}

/// One distinct source URL and the module versions using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitJob {
    pub url: String,
    pub source: SourceUrl,
    pub modules: Vec<ModuleId>,
}

/// Group `(module version, source url)` pairs by URL. Unrecognized URLs are
/// dropped.
pub fn plan_commit_jobs<'a, I>(sources: I) -> Vec<CommitJob>
where
    I: IntoIterator<Item = (ModuleId, &'a str)>,
{
    let mut jobs: BTreeMap<&str, CommitJob> = BTreeMap::new();
    for (id, url) in sources {
        if let Some(job) = jobs.get_mut(url) {
            job.modules.push(id);
            continue;
        }
        let Some(source) = SourceUrl::parse(url) else {
            tracing::trace!("{}: source url {} not resolvable", id, url);
            continue;
        };
        jobs.insert(
            url,
            CommitJob {
                url: url.to_string(),
                source,
                modules: vec![id],
            },
        );
    }
    jobs.into_values().collect()
}

pub struct CommitResolver {
    source: Arc<dyn CommitSource>,
    pool: FanOut,
    retry: RetryPolicy,
}

impl CommitResolver {
    pub fn new(source: Arc<dyn CommitSource>, pool: FanOut, retry: RetryPolicy) -> Self {
        Self { source, pool, retry }
    }

    /// Resolve every job on the pool. Returns the commit of each module
    /// version whose URL resolved; failures are logged and left out.
    pub async fn resolve(&self, jobs: Vec<CommitJob>) -> Result<BTreeMap<ModuleId, String>> {
        let total = jobs.len();
        let source = Arc::clone(&self.source);
        let policy = self.retry;

        let outcomes = self
            .pool
            .run(jobs, move |job| {
                let source = Arc::clone(&source);
                async move {
                    let commit = {
                        let source = source.as_ref();
                        let parsed = &job.source;
                        retry(policy, &job.url, || async move {
                            resolve_commit(source, parsed).await.map_err(Error::into_backoff)
                        })
                        .await
                    };
                    (job, commit)
                }
            })
            .await?;

        let mut commits = BTreeMap::new();
        let mut failed = 0;
        for (job, commit) in outcomes {
            match commit {
                Ok(sha) => {
                    for id in job.modules {
                        commits.insert(id, sha.clone());
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("{} ({}): commit not resolved: {}", job.url, job.source.kind, e);
                }
            }
        }
        tracing::info!("source commits: {} of {} urls resolved", total - failed, total);
        Ok(commits)
    }
}
