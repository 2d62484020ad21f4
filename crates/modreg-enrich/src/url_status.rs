//! URL liveness checks

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modreg_cache::UrlStatusCache;
use modreg_exec::FanOut;
use modreg_model::UrlStatus;
use reqwest::Client;

use crate::error::Result;
use crate::http;

#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// Probe `url`. Transport failures are reported in the status, never
    /// as an error.
    async fn probe(&self, url: &str) -> UrlStatus;
}

/// `HEAD` probe following at most [`http::MAX_REDIRECTS`] redirects.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
        })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn probe(&self, url: &str) -> UrlStatus {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                UrlStatus::new(url, status.as_u16(), status.to_string())
            }
            Err(e) => UrlStatus::failed(url, e.to_string()),
        }
    }
}

/// Whether `url` should be probed at all: an absolute http(s) URL, not a
/// template, not matching any `skip` substring.
pub fn is_checkable(url: &str, skip: &[String]) -> bool {
    (url.starts_with("https://") || url.starts_with("http://"))
        && !url.contains(['{', '}', '$'])
        && !skip.iter().any(|s| !s.is_empty() && url.contains(s.as_str()))
}

/// Probe every URL missing from `cache` on the pool and record the results.
/// Returns the number of URLs probed.
pub async fn check_urls<I>(
    probe: Arc<dyn UrlProbe>,
    pool: &FanOut,
    cache: &mut UrlStatusCache,
    urls: I,
) -> Result<usize>
where
    I: IntoIterator<Item = String>,
{
    let pending: Vec<String> = urls
        .into_iter()
        .filter(|url| !cache.contains(url))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    tracing::info!(
        "checking {} urls with {} workers",
        pending.len(),
        pool.workers_for(pending.len())
    );
    let statuses = pool
        .run(pending, move |url| {
            let probe = Arc::clone(&probe);
            async move { probe.probe(&url).await }
        })
        .await?;

    let probed = statuses.len();
    for status in statuses {
        if !status.exists() {
            tracing::warn!("{}: {} {}", status.url, status.code, status.message);
        }
        cache.insert_fetched(status);
    }
    Ok(probed)
}
