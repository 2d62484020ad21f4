//! The resolution run
//!
//! A [`ResolutionContext`] is created at the start of a run (loading the
//! caches), passed through every phase, and consumed by
//! [`ResolutionContext::finish`] (saving them):
//!
//! ```text
//! ingest ─► cycles ─► per-root selection (regular, dev) ─► ranking
//!                                                            │
//!        ┌───────────── unless offline ──────────────────────┤
//!        ▼                                                   │
//! backup ─► repositories ─► commits ─► releases ─► urls      │
//!        └───────────────────────────────────────────────────┤
//!                                                            ▼
//!                                           annotate registry ─► report
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use modreg_cache::{CacheSaveReport, Caches};
use modreg_enrich::{
    BackupRegistry, CommitResolver, GithubClient, GitlabClient, HttpProbe, RepositoryEnricher,
    SourceUrlKind, check_urls, is_checkable, plan_commit_jobs, refresh_releases,
};
use modreg_exec::FanOut;
use modreg_graph::{
    CycleMap, DepKind, MemoryIndex, MvsResolver, PerRootSelections, Ranking, Root, Selection, detect_cycles,
    ingest, resolve_dependencies, without_root,
};
use modreg_model::{ModuleId, Registry, RepositoryMetadata};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::report::{CycleReport, EnrichmentSummary, ModuleVersionReport, ResolutionReport, SelectionPair};

/// Graph, cycles and selection resolver of one registry.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub resolver: MvsResolver,
    pub cycles: CycleMap,
    pub unresolved: BTreeSet<ModuleId>,
}

impl Analysis {
    /// Ingest `registry` and detect cycles. Fails only on a graph invariant
    /// violation.
    pub fn of(registry: &Registry) -> Result<Self> {
        let ingested = ingest(registry)?;
        let cycles = detect_cycles(ingested.graph.merged());
        tracing::info!(
            "ingested {} module versions: {} cycles, {} unresolved dependencies",
            ingested.known.len(),
            cycles.len(),
            ingested.unresolved.len()
        );
        let resolver = MvsResolver::new(
            &ingested.graph,
            ingested.versions,
            ingested.unresolved.clone(),
            ingested.known,
        );
        Ok(Self {
            resolver,
            cycles,
            unresolved: ingested.unresolved,
        })
    }

    /// Selection for explicit roots.
    pub fn select(&self, kind: DepKind, roots: &[Root]) -> Result<Selection> {
        Ok(self.resolver.select(kind, roots)?)
    }
}

/// Selections of every root and of the whole registry.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub analysis: Analysis,
    pub regular: PerRootSelections,
    pub dev: PerRootSelections,
    pub registry_selection: SelectionPair,
    pub ranking: Ranking,
}

impl Resolution {
    pub async fn compute(analysis: Analysis, pool: &FanOut) -> Result<Self> {
        let regular = analysis.resolver.resolve_per_root(DepKind::Regular, pool).await?;
        let dev = analysis.resolver.resolve_per_root(DepKind::Dev, pool).await?;
        let registry_selection = SelectionPair {
            regular: analysis.resolver.resolve_registry(DepKind::Regular)?,
            dev: analysis.resolver.resolve_registry(DepKind::Dev)?,
        };
        let ranking = Ranking::from_selections(&regular);
        tracing::info!(
            "selected for {} roots; {} module versions ranked",
            regular.len(),
            ranking.ranked().count()
        );
        Ok(Self {
            analysis,
            regular,
            dev,
            registry_selection,
            ranking,
        })
    }
}

pub struct ResolutionContext {
    config: EngineConfig,
    caches: Caches,
    pool: FanOut,
    offline: bool,
}

impl ResolutionContext {
    /// Bind to `config` and load every configured cache.
    pub fn new(config: EngineConfig) -> Self {
        let caches = Caches::load(&config.cache_paths());
        Self {
            pool: config.pool(),
            config,
            caches,
            offline: false,
        }
    }

    /// Skip every network phase.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Run every phase over `registry`, annotating its records in place.
    ///
    /// Only a graph invariant violation (or a crashed worker) is an error;
    /// network and data problems are logged and narrow the report.
    pub async fn resolve(&mut self, registry: &mut Registry) -> Result<ResolutionReport> {
        let started = Instant::now();
        let analysis = Analysis::of(registry)?;
        let resolution = Resolution::compute(analysis, &self.pool).await?;

        let mut summary = EnrichmentSummary {
            offline: self.offline,
            ..Default::default()
        };
        if self.offline {
            tracing::info!("offline: skipping enrichment");
        } else {
            self.enrich(registry, &resolution.ranking, &mut summary).await?;
        }

        annotate(registry, &self.caches);
        let report = build_report(registry, &resolution, summary);
        tracing::info!(
            "resolved {} module versions in {:.2?}",
            report.modules.len(),
            started.elapsed()
        );
        Ok(report)
    }

    async fn enrich(&mut self, registry: &mut Registry, ranking: &Ranking, summary: &mut EnrichmentSummary) -> Result<()> {
        let backup = match &self.config.backup.url {
            Some(url) => BackupRegistry::load(url, self.config.backup_timeout()).await,
            None => None,
        };
        summary.backup_loaded = backup.is_some();

        let github = self.github_client();
        self.enrich_repositories(registry, github.as_ref(), backup.as_ref(), summary).await;
        self.resolve_commits(registry, ranking, github.as_ref(), backup.as_ref(), summary)
            .await?;

        if let (Some(identity), Some(client)) = (self.config.releases.repository.clone(), github.as_ref()) {
            match refresh_releases(client, &identity, &mut self.caches.releases).await {
                Ok(added) => summary.releases_added = added,
                Err(e) => tracing::warn!("{}: release history not fetched: {}", identity, e),
            }
        }

        if self.config.urls.check {
            self.probe_urls(registry, summary).await?;
        }
        Ok(())
    }

    fn github_client(&self) -> Option<GithubClient> {
        let Some(config) = self.config.github_config() else {
            tracing::info!("no GitHub token; GitHub enrichment disabled");
            return None;
        };
        match GithubClient::new(config, Arc::new(self.config.github_limiter())) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("GitHub enrichment disabled: {}", e);
                None
            }
        }
    }

    async fn enrich_repositories(
        &mut self,
        registry: &Registry,
        github: Option<&GithubClient>,
        backup: Option<&BackupRegistry>,
        summary: &mut EnrichmentSummary,
    ) {
        let mut enricher =
            RepositoryEnricher::new(self.config.retry_policy()).skip(self.config.skip_repositories.iter().cloned());
        if let Some(client) = github {
            enricher = enricher.with_source(Arc::new(client.clone()));
        }
        match GitlabClient::new(self.config.gitlab_config(), Arc::new(self.config.gitlab_limiter())) {
            Ok(client) => enricher = enricher.with_source(Arc::new(client)),
            Err(e) => tracing::warn!("GitLab enrichment disabled: {}", e),
        }
        summary.repositories = enricher.enrich(registry, &mut self.caches.repositories, backup).await;
    }

    /// Commit shas of ranked and latest module versions whose source does not
    /// record one yet.
    async fn resolve_commits(
        &self,
        registry: &mut Registry,
        ranking: &Ranking,
        github: Option<&GithubClient>,
        backup: Option<&BackupRegistry>,
        summary: &mut EnrichmentSummary,
    ) -> Result<()> {
        let mut wanted: Vec<(ModuleId, String)> = Vec::new();
        for module in &registry.modules {
            let latest = module.metadata.as_ref().and_then(|md| md.latest_version());
            for mv in &module.versions {
                let Some(source) = mv.source.as_ref() else {
                    continue;
                };
                if source.has_commit_sha() || source.url.is_empty() {
                    continue;
                }
                let id = mv.id();
                if ranking.rank(&id) == 0 && latest != Some(mv.version.as_str()) {
                    continue;
                }
                wanted.push((id, source.url.clone()));
            }
        }

        let mut commits: BTreeMap<ModuleId, String> = BTreeMap::new();
        if let Some(backup) = backup {
            wanted.retain(|(id, _)| match backup.commit_sha(id) {
                Some(sha) => {
                    commits.insert(id.clone(), sha.to_string());
                    false
                }
                None => true,
            });
            summary.commits_from_backup = commits.len();
        }

        let jobs = plan_commit_jobs(wanted.iter().map(|(id, url)| (id.clone(), url.as_str())));
        let resolved = match github {
            Some(client) => {
                let resolver = CommitResolver::new(Arc::new(client.clone()), self.pool, self.config.retry_policy());
                resolver.resolve(jobs).await?
            }
            None => jobs
                .into_iter()
                .filter(|job| job.source.kind == SourceUrlKind::Commit)
                .flat_map(|job| {
                    let sha = job.source.reference;
                    job.modules.into_iter().map(move |id| (id, sha.clone()))
                })
                .collect(),
        };
        summary.commits_resolved = resolved.len();
        commits.extend(resolved);

        for mv in registry.module_versions_mut() {
            let Some(sha) = commits.get(&mv.id()) else {
                continue;
            };
            if let Some(source) = mv.source.as_mut() {
                source.commit_sha = Some(sha.clone());
            }
        }
        Ok(())
    }

    async fn probe_urls(&mut self, registry: &Registry, summary: &mut EnrichmentSummary) -> Result<()> {
        let skip = &self.config.urls.skip;
        let urls: Vec<String> = registry
            .module_versions()
            .filter_map(|mv| mv.source.as_ref())
            .flat_map(|source| std::iter::once(source.url.as_str()).chain(source.docs_url.as_deref()))
            .filter(|url| is_checkable(url, skip))
            .map(str::to_string)
            .collect();

        let probe = match HttpProbe::new(self.config.probe_timeout()) {
            Ok(probe) => probe,
            Err(e) => {
                tracing::warn!("URL checks disabled: {}", e);
                return Ok(());
            }
        };
        summary.urls_probed = check_urls(Arc::new(probe), &self.pool, &mut self.caches.url_status, urls).await?;
        Ok(())
    }

    /// Save every cache. Failures are per cache and never abort.
    pub fn finish(self) -> CacheSaveReport {
        self.caches.save_all()
    }
}

/// Copy cached repository metadata and URL statuses onto the registry.
fn annotate(registry: &mut Registry, caches: &Caches) {
    for module in &mut registry.modules {
        let cached = module
            .metadata
            .as_ref()
            .and_then(|md| md.repository.iter().find_map(|r| RepositoryMetadata::parse(r)))
            .and_then(|md| caches.repositories.get(&md.identity()));
        if let Some(md) = cached {
            module.repository_metadata = Some(md.clone());
        }

        for mv in &mut module.versions {
            let Some(source) = mv.source.as_mut() else {
                continue;
            };
            if let Some(status) = caches.url_status.get(&source.url) {
                source.url_status = Some(status.clone());
            }
            let docs = source.docs_url.as_deref().and_then(|url| caches.url_status.get(url));
            if let Some(status) = docs {
                source.docs_url_status = Some(status.clone());
            }
        }
    }
}

fn build_report(registry: &Registry, resolution: &Resolution, enrichment: EnrichmentSummary) -> ResolutionReport {
    let analysis = &resolution.analysis;
    let ids: Vec<ModuleId> = registry.module_versions().map(|mv| mv.id()).collect();
    let index = MemoryIndex::for_registry(&ids, &analysis.cycles);

    let mut modules = BTreeMap::new();
    let mut repositories = BTreeMap::new();
    for module in &registry.modules {
        if let Some(md) = &module.repository_metadata {
            repositories.insert(md.identity(), md.clone());
        }
        let latest = module.metadata.as_ref().and_then(|md| md.latest_version());

        for mv in &module.versions {
            let id = mv.id();
            let selection = SelectionPair {
                regular: resolution
                    .regular
                    .get(&id)
                    .map(|s| without_root(&id, s))
                    .unwrap_or_default(),
                dev: resolution
                    .dev
                    .get(&id)
                    .map(|s| without_root(&id, s))
                    .unwrap_or_default(),
            };
            let source = mv.source.as_ref();
            let report = ModuleVersionReport {
                selection,
                rank: resolution.ranking.rank(&id),
                latest: latest == Some(mv.version.as_str()),
                dependencies: resolve_dependencies(mv, &analysis.cycles, &index, &analysis.unresolved),
                cycle: analysis.cycles.cycle_name_of(&id).map(str::to_string),
                commit_sha: source.and_then(|s| s.commit_sha.clone()).filter(|sha| !sha.is_empty()),
                source_status: source.and_then(|s| s.url_status.clone()),
                docs_status: source.and_then(|s| s.docs_url_status.clone()),
            };
            modules.insert(id.to_string(), report);
        }
    }

    ResolutionReport {
        generated_at: Utc::now(),
        modules,
        cycles: analysis
            .cycles
            .cycles()
            .iter()
            .map(|c| CycleReport {
                name: c.name.clone(),
                members: c.members.iter().map(ToString::to_string).collect(),
            })
            .collect(),
        unresolved: analysis.unresolved.iter().map(ToString::to_string).collect(),
        registry_selection: resolution.registry_selection.clone(),
        preferred_versions: resolution.ranking.preferred_versions(),
        repositories,
        enrichment,
    }
}
