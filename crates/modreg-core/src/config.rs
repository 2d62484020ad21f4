//! Engine configuration (`modreg.toml`)
//!
//! Every field has a default, so an empty file is a complete configuration:
//!
//! ```toml
//! skip_repositories = ["github:bazel-contrib/rules_pex"]
//!
//! [caches]
//! repository_metadata = "${CACHE_DIR}/repository_metadata.json"
//! url_status = "${CACHE_DIR}/url_status.json"
//!
//! [backup]
//! url = "https://registry.example.com/registry.json.gz"
//!
//! [github]
//! requests_per_hour = 4800
//! burst = 1000
//!
//! [resolution]
//! workers = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use modreg_cache::CachePaths;
use modreg_enrich::{GithubConfig, GitlabConfig};
use modreg_exec::{DEFAULT_MAX_WORKERS, FanOut, RateLimiter, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical identities never fetched from a provider
    pub skip_repositories: Vec<String>,
    pub caches: CacheSection,
    pub backup: BackupSection,
    pub github: GithubSection,
    pub gitlab: GitlabSection,
    pub resolution: ResolutionSection,
    pub retry: RetrySection,
    pub timeouts: TimeoutSection,
    pub urls: UrlSection,
    pub releases: ReleasesSection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_repositories: vec!["github:bazel-contrib/rules_pex".to_string()],
            caches: CacheSection::default(),
            backup: BackupSection::default(),
            github: GithubSection::default(),
            gitlab: GitlabSection::default(),
            resolution: ResolutionSection::default(),
            retry: RetrySection::default(),
            timeouts: TimeoutSection::default(),
            urls: UrlSection::default(),
            releases: ReleasesSection::default(),
        }
    }
}

/// Cache file locations; `$VAR` and `${VAR}` are expanded. An absent entry
/// disables that cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub releases: Option<String>,
    pub repository_metadata: Option<String>,
    pub url_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSection {
    /// Prior registry export; a `.gz` suffix means gzip
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    /// Falls back to `GITHUB_TOKEN`. Without a token nothing is fetched
    /// from GitHub.
    pub token: Option<String>,
    pub graphql_url: String,
    pub api_url: String,
    pub requests_per_hour: u32,
    pub burst: u32,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            token: None,
            graphql_url: modreg_enrich::github::GRAPHQL_URL.to_string(),
            api_url: modreg_enrich::github::API_URL.to_string(),
            requests_per_hour: 4800,
            burst: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabSection {
    /// Falls back to `GITLAB_TOKEN`; optional for public projects
    pub token: Option<String>,
    pub graphql_url: String,
    pub requests_per_hour: u32,
    pub burst: u32,
}

impl Default for GitlabSection {
    fn default() -> Self {
        Self {
            token: None,
            graphql_url: modreg_enrich::gitlab::GRAPHQL_URL.to_string(),
            requests_per_hour: 4800,
            burst: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSection {
    /// Upper bound of every worker pool
    pub workers: usize,
}

impl Default for ResolutionSection {
    fn default() -> Self {
        Self {
            workers: DEFAULT_MAX_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub probe_secs: u64,
    pub rest_secs: u64,
    pub graphql_secs: u64,
    pub backup_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            probe_secs: 2,
            rest_secs: 30,
            graphql_secs: 60,
            backup_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlSection {
    pub check: bool,
    /// Substrings of URLs never probed
    pub skip: Vec<String>,
}

impl Default for UrlSection {
    fn default() -> Self {
        Self {
            check: true,
            skip: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasesSection {
    /// Canonical identity whose release history is cached
    pub repository: Option<String>,
}

impl EngineConfig {
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read `path` and fill missing tokens from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = modreg_fs::read_text(path)?;
        let mut config = Self::parse(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.fill_tokens(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Defaults plus tokens from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.fill_tokens(|name| std::env::var(name).ok());
        config
    }

    /// Take tokens not set in the file from `lookup`.
    pub fn fill_tokens<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |token: Option<String>| token.filter(|t| !t.trim().is_empty());
        self.github.token = non_empty(self.github.token.take()).or_else(|| non_empty(lookup(GITHUB_TOKEN_ENV)));
        self.gitlab.token = non_empty(self.gitlab.token.take()).or_else(|| non_empty(lookup(GITLAB_TOKEN_ENV)));
    }

    pub fn cache_paths(&self) -> CachePaths {
        let expand = |path: &Option<String>| {
            path.as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| PathBuf::from(modreg_fs::expand_env(p).into_owned()))
        };
        CachePaths {
            releases: expand(&self.caches.releases),
            repository_metadata: expand(&self.caches.repository_metadata),
            url_status: expand(&self.caches.url_status),
        }
    }

    pub fn pool(&self) -> FanOut {
        FanOut::new(self.resolution.workers)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.attempts, Duration::from_millis(self.retry.base_delay_ms))
    }

    /// GitHub client settings, or `None` without a token.
    pub fn github_config(&self) -> Option<GithubConfig> {
        let token = self.github.token.clone()?;
        Some(GithubConfig {
            token,
            graphql_url: self.github.graphql_url.clone(),
            api_url: self.github.api_url.clone(),
            graphql_timeout: Duration::from_secs(self.timeouts.graphql_secs),
            rest_timeout: Duration::from_secs(self.timeouts.rest_secs),
        })
    }

    pub fn gitlab_config(&self) -> GitlabConfig {
        GitlabConfig {
            token: self.gitlab.token.clone(),
            graphql_url: self.gitlab.graphql_url.clone(),
            timeout: Duration::from_secs(self.timeouts.graphql_secs),
        }
    }

    pub fn github_limiter(&self) -> RateLimiter {
        RateLimiter::per_hour(self.github.requests_per_hour, self.github.burst)
    }

    pub fn gitlab_limiter(&self) -> RateLimiter {
        RateLimiter::per_hour(self.gitlab.requests_per_hour, self.gitlab.burst)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.probe_secs)
    }

    pub fn backup_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.backup_secs)
    }
}
