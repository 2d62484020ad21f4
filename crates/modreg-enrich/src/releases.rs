//! Release history of a tracked repository

use modreg_cache::ReleaseCache;
use modreg_model::{RepositoryMetadata, RepositoryType};

use crate::error::Result;
use crate::github::GithubClient;

/// Fetch the release history of `identity` and add what the cache does not
/// hold yet. Returns the number of new or changed releases.
///
/// Only GitHub repositories have a release history; others are skipped.
pub async fn refresh_releases(github: &GithubClient, identity: &str, cache: &mut ReleaseCache) -> Result<usize> {
    let repo = match RepositoryMetadata::parse(identity) {
        Some(repo) if repo.kind == RepositoryType::Github => repo,
        _ => {
            tracing::warn!("{}: release history is only available for GitHub repositories", identity);
            return Ok(0);
        }
    };

    let releases = github.fetch_releases(&repo.organization, &repo.name).await?;
    let total = releases.len();
    let mut changed = 0;
    for release in releases {
        if cache.get(&release.version) == Some(&release) {
            continue;
        }
        cache.insert_fetched(release);
        changed += 1;
    }
    tracing::info!("{}: {} releases, {} new", identity, total, changed);
    Ok(changed)
}
