//! GitHub GraphQL and REST client

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modreg_exec::RateLimiter;
use modreg_model::{ModuleCommit, Release, RepositoryMetadata, RepositoryType};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::commits::CommitSource;
use crate::error::{Error, Result};
use crate::repositories::{MAX_BATCH, RepositorySource};
use crate::{graphql, http};

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const API_URL: &str = "https://api.github.com";
const WEB_URL: &str = "https://github.com";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    pub graphql_url: String,
    pub api_url: String,
    pub graphql_timeout: Duration,
    pub rest_timeout: Duration,
}

impl GithubConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            graphql_url: GRAPHQL_URL.to_string(),
            api_url: API_URL.to_string(),
            graphql_timeout: Duration::from_secs(60),
            rest_timeout: Duration::from_secs(30),
        }
    }
}

/// Authenticated GitHub client. Every request first takes a token from the
/// shared rate limiter.
#[derive(Debug, Clone)]
pub struct GithubClient {
    graphql: Client,
    rest: Client,
    config: GithubConfig,
    limiter: Arc<RateLimiter>,
}

impl GithubClient {
    pub fn new(config: GithubConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        Ok(Self {
            graphql: http::client(config.graphql_timeout)?,
            rest: http::client(config.rest_timeout)?,
            config,
            limiter,
        })
    }

    async fn query<T: DeserializeOwned>(&self, query: &str) -> Result<T> {
        self.limiter.acquire().await;
        graphql::execute(
            &self.graphql,
            &self.config.graphql_url,
            Some(&self.config.token),
            query,
        )
        .await
    }

    async fn get<T: DeserializeOwned>(&self, org: &str, repo: &str, path: &str) -> Result<T> {
        let url = format!(
            "{}/repos/{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            org,
            repo,
            path
        );
        self.limiter.acquire().await;
        let request = self
            .rest
            .get(&url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        http::fetch_json(request, &url).await
    }

    /// Fetch description, stars and languages for up to [`MAX_BATCH`]
    /// repositories in one query.
    ///
    /// Returns a fetched copy of every repository GitHub knows; unknown ones
    /// are logged and left out.
    pub async fn fetch_repositories(&self, batch: &[RepositoryMetadata]) -> Result<Vec<RepositoryMetadata>> {
        if batch.len() > MAX_BATCH {
            return Err(Error::BatchTooLarge {
                size: batch.len(),
                limit: MAX_BATCH,
            });
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut data: HashMap<String, Option<GithubRepository>> =
            self.query(&repositories_query(batch)).await?;

        let mut fetched = Vec::with_capacity(batch.len());
        for (i, requested) in batch.iter().enumerate() {
            let Some(repo) = data.remove(&format!("repo{}", i)).flatten() else {
                tracing::warn!("{}: repository not found", requested.identity());
                continue;
            };
            let mut record = requested.clone();
            record.description = repo.description.unwrap_or_default();
            record.stargazers = repo.stargazer_count;
            let languages = repo
                .languages
                .map(|l| l.edges)
                .unwrap_or_default()
                .into_iter()
                .map(|edge| (edge.node.name, edge.size))
                .collect::<BTreeMap<_, _>>();
            record.set_languages(languages);
            fetched.push(record);
        }
        Ok(fetched)
    }

    /// Complete release history of `org/name`, newest first, drafts skipped.
    pub async fn fetch_releases(&self, org: &str, name: &str) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: ReleasesData = self.query(&releases_query(org, name, cursor.as_deref())).await?;
            let Some(repository) = data.repository else {
                return Err(Error::GraphQl {
                    url: self.config.graphql_url.clone(),
                    messages: format!("repository {}/{} not found", org, name),
                });
            };
            let page = repository.releases;

            for node in page.nodes {
                if node.is_draft || node.tag_name.is_empty() {
                    continue;
                }
                let url = format!("{}/{}/{}/archive/refs/tags/{}.tar.gz", WEB_URL, org, name, node.tag_name);
                let commit = node.tag_commit.map(|c| ModuleCommit {
                    sha1: c.oid,
                    date: c.committed_date.unwrap_or_default(),
                    message: c.message.unwrap_or_default(),
                });
                releases.push(Release {
                    version: node.tag_name,
                    url,
                    prerelease: node.is_prerelease,
                    commit,
                });
            }

            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => {
                    tracing::debug!("{}/{}: fetched {} releases so far", org, name, releases.len());
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        Ok(releases)
    }

    /// Commit a tag points at, dereferencing annotated tags.
    pub async fn tag_commit_sha(&self, org: &str, repo: &str, tag: &str) -> Result<String> {
        let reference: GitRef = self.get(org, repo, &format!("git/ref/tags/{}", tag)).await?;
        self.peel(org, repo, reference.object).await
    }

    async fn peel(&self, org: &str, repo: &str, object: GitObject) -> Result<String> {
        if object.kind == "tag" {
            let tag: GitRef = self.get(org, repo, &format!("git/tags/{}", object.sha)).await?;
            return Ok(tag.object.sha);
        }
        Ok(object.sha)
    }

    /// Commit a release's `target_commitish` resolves to, tried as a branch,
    /// then a tag, then a full commit sha.
    pub async fn release_commit_sha(&self, org: &str, repo: &str, version: &str) -> Result<String> {
        let release: GithubRelease = self.get(org, repo, &format!("releases/tags/{}", version)).await?;
        let target = release.target_commitish;
        let unresolved = || Error::UnresolvedReference {
            repository: format!("{}/{}", org, repo),
            reference: target.clone(),
        };
        if target.is_empty() {
            return Err(unresolved());
        }

        match self.get::<Branch>(org, repo, &format!("branches/{}", target)).await {
            Ok(branch) => return Ok(branch.commit.sha),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.get::<GitRef>(org, repo, &format!("git/ref/tags/{}", target)).await {
            Ok(reference) => return self.peel(org, repo, reference.object).await,
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        if target.len() == 40 && target.chars().all(|c| c.is_ascii_hexdigit()) {
            match self.get::<Commit>(org, repo, &format!("commits/{}", target)).await {
                Ok(commit) => return Ok(commit.sha),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Err(unresolved())
    }
}

#[async_trait]
impl RepositorySource for GithubClient {
    fn kind(&self) -> RepositoryType {
        RepositoryType::Github
    }

    async fn fetch_batch(&self, batch: &[RepositoryMetadata]) -> Result<Vec<RepositoryMetadata>> {
        self.fetch_repositories(batch).await
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn tag_commit(&self, org: &str, repo: &str, tag: &str) -> Result<String> {
        self.tag_commit_sha(org, repo, tag).await
    }

    async fn release_commit(&self, org: &str, repo: &str, version: &str) -> Result<String> {
        self.release_commit_sha(org, repo, version).await
    }
}

fn repositories_query(batch: &[RepositoryMetadata]) -> String {
    let mut query = String::from("query {\n");
    for (i, repo) in batch.iter().enumerate() {
        query.push_str(&format!(
            "  repo{}: repository(owner: {}, name: {}) {{ description stargazerCount \
             languages(first: 10, orderBy: {{field: SIZE, direction: DESC}}) {{ edges {{ size node {{ name }} }} }} }}\n",
            i,
            http::quote(&repo.organization),
            http::quote(&repo.name),
        ));
    }
    query.push('}');
    query
}

fn releases_query(org: &str, name: &str, after: Option<&str>) -> String {
    let after = after
        .map(|cursor| format!(", after: {}", http::quote(cursor)))
        .unwrap_or_default();
    format!(
        "query {{\n  repository(owner: {}, name: {}) {{\n    \
         releases(first: 100{}, orderBy: {{field: CREATED_AT, direction: DESC}}) {{\n      \
         nodes {{ tagName isDraft isPrerelease tagCommit {{ oid committedDate message }} }}\n      \
         pageInfo {{ hasNextPage endCursor }}\n    }}\n  }}\n}}",
        http::quote(org),
        http::quote(name),
        after
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubRepository {
    description: Option<String>,
    #[serde(default)]
    stargazer_count: u32,
    languages: Option<LanguageConnection>,
}

#[derive(Deserialize)]
struct LanguageConnection {
    #[serde(default)]
    edges: Vec<LanguageEdge>,
}

#[derive(Deserialize)]
struct LanguageEdge {
    size: i64,
    node: LanguageNode,
}

#[derive(Deserialize)]
struct LanguageNode {
    name: String,
}

#[derive(Deserialize)]
struct ReleasesData {
    repository: Option<ReleaseRepository>,
}

#[derive(Deserialize)]
struct ReleaseRepository {
    releases: ReleaseConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseConnection {
    #[serde(default)]
    nodes: Vec<ReleaseNode>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    is_prerelease: bool,
    tag_commit: Option<TagCommit>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagCommit {
    oid: String,
    committed_date: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct GithubRelease {
    #[serde(default)]
    target_commitish: String,
}

#[derive(Deserialize)]
struct Branch {
    commit: Commit,
}

#[derive(Deserialize)]
struct Commit {
    sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repositories_query_aliases() {
        let batch = vec![
            RepositoryMetadata::new(RepositoryType::Github, "madler", "zlib"),
            RepositoryMetadata::new(RepositoryType::Github, "google", "re2"),
        ];
        let query = repositories_query(&batch);
        assert!(query.contains("repo0: repository(owner: \"madler\", name: \"zlib\")"));
        assert!(query.contains("repo1: repository(owner: \"google\", name: \"re2\")"));
        assert!(query.contains("stargazerCount"));
    }

    #[test]
    fn test_releases_query_cursor() {
        assert!(!releases_query("bazelbuild", "bazel", None).contains("after:"));
        assert!(releases_query("bazelbuild", "bazel", Some("Y3Vy")).contains(", after: \"Y3Vy\""));
    }
}
