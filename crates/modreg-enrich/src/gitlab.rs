//! GitLab GraphQL client

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modreg_exec::RateLimiter;
use modreg_model::{RepositoryMetadata, RepositoryType};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::repositories::{MAX_BATCH, RepositorySource};
use crate::{graphql, http};

pub const GRAPHQL_URL: &str = "https://gitlab.com/api/graphql";

#[derive(Debug, Clone)]
pub struct GitlabConfig {
    /// Public projects are readable without one
    pub token: Option<String>,
    pub graphql_url: String,
    pub timeout: Duration,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            token: None,
            graphql_url: GRAPHQL_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitlabClient {
    client: Client,
    config: GitlabConfig,
    limiter: Arc<RateLimiter>,
}

impl GitlabClient {
    pub fn new(config: GitlabConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout)?,
            config,
            limiter,
        })
    }

    /// Fetch description, stars and languages for up to [`MAX_BATCH`]
    /// projects in one query. Language shares are scaled by 10000.
    pub async fn fetch_projects(&self, batch: &[RepositoryMetadata]) -> Result<Vec<RepositoryMetadata>> {
        if batch.len() > MAX_BATCH {
            return Err(Error::BatchTooLarge {
                size: batch.len(),
                limit: MAX_BATCH,
            });
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        self.limiter.acquire().await;
        let mut data: HashMap<String, Option<GitlabProject>> = graphql::execute(
            &self.client,
            &self.config.graphql_url,
            self.config.token.as_deref(),
            &projects_query(batch),
        )
        .await?;

        let mut fetched = Vec::with_capacity(batch.len());
        for (i, requested) in batch.iter().enumerate() {
            let Some(project) = data.remove(&format!("repo{}", i)).flatten() else {
                tracing::warn!("{}: project not found", requested.identity());
                continue;
            };
            let mut record = requested.clone();
            record.description = project.description.unwrap_or_default();
            record.stargazers = project.star_count;
            let languages = project
                .languages
                .unwrap_or_default()
                .into_iter()
                .map(|lang| (lang.name, (lang.share * 10000.0) as i64))
                .collect::<BTreeMap<_, _>>();
            record.set_languages(languages);
            fetched.push(record);
        }
        Ok(fetched)
    }
}

#[async_trait]
impl RepositorySource for GitlabClient {
    fn kind(&self) -> RepositoryType {
        RepositoryType::Gitlab
    }

    async fn fetch_batch(&self, batch: &[RepositoryMetadata]) -> Result<Vec<RepositoryMetadata>> {
        self.fetch_projects(batch).await
    }
}

fn projects_query(batch: &[RepositoryMetadata]) -> String {
    let mut query = String::from("query {\n");
    for (i, repo) in batch.iter().enumerate() {
        query.push_str(&format!(
            "  repo{}: project(fullPath: {}) {{ description starCount languages {{ name share }} }}\n",
            i,
            http::quote(&repo.full_name()),
        ));
    }
    query.push('}');
    query
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitlabProject {
    description: Option<String>,
    #[serde(default)]
    star_count: u32,
    languages: Option<Vec<GitlabLanguage>>,
}

#[derive(Deserialize)]
struct GitlabLanguage {
    name: String,
    share: f64,
}
