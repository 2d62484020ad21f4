//! Backup registry and URL probes against a mock server.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::HEAD;
use httpmock::prelude::*;
use modreg_cache::{RecordCache, SavePolicy};
use modreg_enrich::{BackupRegistry, GithubClient, GithubConfig, HttpProbe, RepositoryEnricher, check_urls};
use modreg_exec::{FanOut, RateLimiter, RetryPolicy};
use modreg_model::{RepositoryMetadata, RepositoryType, UrlStatus};
use modreg_test_utils::RegistryBuilder;
use pretty_assertions::assert_eq;

const TIMEOUT: Duration = Duration::from_secs(5);

fn backed_up_registry() -> modreg_model::Registry {
    let mut md = RepositoryMetadata::new(RepositoryType::Github, "madler", "zlib");
    md.description = "compression".to_string();
    md.stargazers = 5900;
    md.set_languages(BTreeMap::from([("C".to_string(), 9000)]));
    RegistryBuilder::new()
        .version("zlib", "1.3.1", &[])
        .repository("zlib", "github:madler/zlib")
        .repository_metadata("zlib", md)
        .build()
}

#[tokio::test]
async fn test_backup_short_circuits_provider() {
    let server = MockServer::start_async().await;
    let snapshot = serde_json::to_vec(&backed_up_registry()).unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/registry.json");
            then.status(200).body(snapshot.clone());
        })
        .await;
    let graphql = server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql");
            then.status(500);
        })
        .await;

    let backup = BackupRegistry::load(&server.url("/registry.json"), TIMEOUT)
        .await
        .unwrap();
    let mut config = GithubConfig::new("token");
    config.graphql_url = server.url("/graphql");
    let github = GithubClient::new(config, Arc::new(RateLimiter::unlimited())).unwrap();

    let registry = RegistryBuilder::new()
        .version("zlib", "1.3.1", &[])
        .repository("zlib", "github:madler/zlib")
        .build();
    let mut cache = RecordCache::new("repository metadata", None, SavePolicy::WhenDirty);
    let report = RepositoryEnricher::new(RetryPolicy::immediate(1))
        .with_source(Arc::new(github))
        .enrich(&registry, &mut cache, Some(&backup))
        .await;

    graphql.assert_hits_async(0).await;
    assert_eq!(report.from_backup, 1);
    let md = cache.get("github:madler/zlib").unwrap();
    assert_eq!(md.description, "compression");
    assert_eq!(md.primary_language.as_deref(), Some("C"));
    assert!(cache.is_dirty());
}

#[tokio::test]
async fn test_backup_unavailable_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/registry.json.gz");
            then.status(404);
        })
        .await;

    assert!(BackupRegistry::load(&server.url("/registry.json.gz"), TIMEOUT).await.is_none());
}

#[tokio::test]
async fn test_check_urls_probes_uncached_only() {
    let server = MockServer::start_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(HEAD).path("/ok.tar.gz");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/missing.tar.gz");
            then.status(404);
        })
        .await;
    let cached = server
        .mock_async(|when, then| {
            when.method(HEAD).path("/cached.tar.gz");
            then.status(200);
        })
        .await;

    let mut cache = RecordCache::new("url status", None, SavePolicy::Always);
    cache.insert(UrlStatus::new(server.url("/cached.tar.gz"), 200, "200 OK"));

    let urls = vec![
        server.url("/ok.tar.gz"),
        server.url("/ok.tar.gz"),
        server.url("/missing.tar.gz"),
        server.url("/cached.tar.gz"),
        "http://127.0.0.1:1/refused.tar.gz".to_string(),
    ];
    let probe = Arc::new(HttpProbe::new(TIMEOUT).unwrap());
    let probed = check_urls(probe, &FanOut::new(4), &mut cache, urls).await.unwrap();

    assert_eq!(probed, 3);
    ok.assert_hits_async(1).await;
    cached.assert_hits_async(0).await;
    assert!(cache.get(&server.url("/ok.tar.gz")).unwrap().exists());
    assert_eq!(cache.get(&server.url("/missing.tar.gz")).unwrap().code, 404);
    let refused = cache.get("http://127.0.0.1:1/refused.tar.gz").unwrap();
    assert_eq!(refused.code, 0);
    assert!(!refused.message.is_empty());
}
