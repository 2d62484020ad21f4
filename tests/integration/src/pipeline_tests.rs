//! End-to-end resolution of a registry snapshot
//!
//! One full run against mock GitHub, GitLab, backup and docs endpoints,
//! followed by checks of the report, the annotated registry and the cache
//! files left on disk.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use httpmock::Method::HEAD;
use httpmock::prelude::*;
use modreg_cache::SaveOutcome;
use modreg_core::{EngineConfig, ResolutionContext};
use modreg_graph::{DependencyTarget, Selection};
use modreg_model::{Registry, RepositoryMetadata, RepositoryType};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

const PROTOBUF_SHA: &str = "9a8b7c6d5e4f3a2b1c0d9a8b7c6d5e4f3a2b1c0d";
const PLATFORMS_SHA: &str = "0123456789abcdef0123456789abcdef01234567";
const GRPC_SHA: &str = "5ca1ab1e5ca1ab1e5ca1ab1e5ca1ab1e5ca1ab1e";
const RULES_CC_SHA: &str = "c0ffeec0ffeec0ffeec0ffeec0ffeec0ffeec0ff";

fn snapshot(docs_url: &str) -> Registry {
    serde_json::from_value(json!({
        "modules": [
            {
                "name": "platforms",
                "metadata": {"repository": ["github:bazelbuild/platforms"], "versions": ["0.0.10", "0.0.11"]},
                "versions": [
                    {"name": "platforms", "version": "0.0.10"},
                    {"name": "platforms", "version": "0.0.11", "source": {
                        "url": format!("https://github.com/bazelbuild/platforms/archive/{}.tar.gz", PLATFORMS_SHA),
                        "integrity": "sha256-abc="
                    }}
                ]
            },
            {
                "name": "rules_cc",
                "metadata": {"repository": ["https://github.com/bazelbuild/rules_cc"], "versions": ["0.0.9", "0.1.1"]},
                "versions": [
                    {"name": "rules_cc", "version": "0.0.9", "deps": [{"name": "platforms", "version": "0.0.10"}]},
                    {"name": "rules_cc", "version": "0.1.1",
                     "deps": [{"name": "platforms", "version": "0.0.11"}],
                     "source": {
                        "url": "https://github.com/bazelbuild/rules_cc/releases/download/0.1.1/rules_cc-0.1.1.tar.gz",
                        "strip_prefix": "rules_cc-0.1.1"
                     }}
                ]
            },
            {
                "name": "protobuf",
                "metadata": {"repository": ["github:protocolbuffers/protobuf"], "versions": ["29.0"]},
                "versions": [
                    {"name": "protobuf", "version": "29.0",
                     "deps": [
                        {"name": "grpc", "version": "1.66.0"},
                        {"name": "rules_cc", "version": "0.1.1"},
                        {"name": "googletest", "version": "1.15.2", "dev": true,
                         "override": {"kind": "local_path", "path": "third_party/googletest"}}
                     ],
                     "source": {
                        "url": "https://github.com/protocolbuffers/protobuf/archive/refs/tags/v29.0.tar.gz",
                        "docs_url": docs_url,
                        "commit_sha": PROTOBUF_SHA
                     }}
                ]
            },
            {
                "name": "grpc",
                "metadata": {"repository": ["github:grpc/grpc"], "versions": ["1.66.0"]},
                "versions": [
                    {"name": "grpc", "version": "1.66.0",
                     "deps": [
                        {"name": "protobuf", "version": "29.0"},
                        {"name": "rules_cc", "version": "0.0.9"}
                     ],
                     "source": {"url": "https://github.com/grpc/grpc/archive/refs/tags/v1.66.0.tar.gz"}}
                ]
            },
            {
                "name": "rules_gitlab",
                "metadata": {"repository": ["gitlab:org/proj"], "versions": ["1.0"]},
                "versions": [{"name": "rules_gitlab", "version": "1.0"}]
            },
            {
                "name": "rules_pex",
                "metadata": {"repository": ["github:bazel-contrib/rules_pex"], "versions": ["0.1"]},
                "versions": [{"name": "rules_pex", "version": "0.1", "deps": [{"name": "rules_python", "version": "0.3"}]}]
            }
        ]
    }))
    .unwrap()
}

/// Prior export: protobuf's repository metadata and grpc's commit.
fn backup_gz() -> Vec<u8> {
    let mut protobuf = RepositoryMetadata::new(RepositoryType::Github, "protocolbuffers", "protobuf");
    protobuf.description = "Protocol Buffers".to_string();
    protobuf.stargazers = 66000;
    protobuf.set_languages([("C++".to_string(), 50_000_000)].into_iter().collect());

    let backup = json!({
        "modules": [
            {
                "name": "protobuf",
                "metadata": {"repository": ["github:protocolbuffers/protobuf"], "versions": ["29.0"]},
                "versions": [{"name": "protobuf", "version": "29.0"}],
                "repository_metadata": protobuf
            },
            {
                "name": "grpc",
                "versions": [{"name": "grpc", "version": "1.66.0", "source": {
                    "url": "https://github.com/grpc/grpc/archive/refs/tags/v1.66.0.tar.gz",
                    "commit_sha": GRPC_SHA
                }}]
            }
        ]
    });

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(&backup).unwrap()).unwrap();
    encoder.finish().unwrap()
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_pipeline() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/backup/registry.json.gz");
            then.status(200).body(backup_gz());
        })
        .await;
    let repositories = server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql").body_contains("repo0: repository");
            then.status(200).json_body(json!({"data": {
                "repo0": {
                    "description": "Constraint values for specifying platforms",
                    "stargazerCount": 120,
                    "languages": {"edges": [{"size": 4000, "node": {"name": "Starlark"}}]}
                },
                "repo1": {
                    "description": "C++ rules",
                    "stargazerCount": 200,
                    "languages": {"edges": [
                        {"size": 80000, "node": {"name": "Starlark"}},
                        {"size": 5000, "node": {"name": "C++"}}
                    ]}
                },
                "repo2": null
            }}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql").body_contains("releases(first: 100");
            then.status(200).json_body(json!({"data": {"repository": {"releases": {
                "nodes": [
                    {"tagName": "8.0.0", "isDraft": false, "isPrerelease": false,
                     "tagCommit": {"oid": "8c0a", "committedDate": "2024-12-09T16:00:00Z", "message": "Release 8.0.0"}}
                ],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }}}}));
        })
        .await;
    let gitlab = server
        .mock_async(|when, then| {
            when.method(POST).path("/gitlab/graphql").body_contains("fullPath");
            then.status(200).json_body(json!({"data": {"repo0": {
                "description": "GitLab rules",
                "starCount": 7,
                "languages": [{"name": "Starlark", "share": 100.0}]
            }}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/bazelbuild/rules_cc/releases/tags/0.1.1");
            then.status(200).json_body(json!({"tag_name": "0.1.1", "target_commitish": "main"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/bazelbuild/rules_cc/branches/main");
            then.status(200).json_body(json!({"name": "main", "commit": {"sha": RULES_CC_SHA}}));
        })
        .await;
    let grpc_tag = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/grpc/grpc/git/ref/tags/v1.66.0");
            then.status(500);
        })
        .await;
    let docs = server
        .mock_async(|when, then| {
            when.method(HEAD).path("/docs/protobuf.html");
            then.status(404);
        })
        .await;

    let dir = TempDir::new().unwrap();
    let config = EngineConfig::parse(&format!(
        r#"
        [caches]
        releases = "{dir}/releases.json"
        repository_metadata = "{dir}/repository_metadata.json"
        url_status = "{dir}/url_status.json"

        [backup]
        url = "{backup}"

        [github]
        token = "test-token"
        graphql_url = "{graphql}"
        api_url = "{api}"

        [gitlab]
        graphql_url = "{gitlab}"

        [resolution]
        workers = 4

        [retry]
        attempts = 2
        base_delay_ms = 0

        [urls]
        skip = ["github.com"]

        [releases]
        repository = "github:bazelbuild/bazel"
        "#,
        dir = dir.path().display(),
        backup = server.url("/backup/registry.json.gz"),
        graphql = server.url("/graphql"),
        api = server.base_url(),
        gitlab = server.url("/gitlab/graphql"),
    ))
    .unwrap();

    let mut registry = snapshot(&server.url("/docs/protobuf.html"));
    let mut ctx = ResolutionContext::new(config);
    let report = ctx.resolve(&mut registry).await.unwrap();
    let saved = ctx.finish();

    // ========================================================================
    // Selection, ranking and cycles
    // ========================================================================

    let protobuf = report.module("protobuf@29.0").unwrap();
    assert_eq!(
        protobuf.selection.regular,
        [("grpc", "1.66.0"), ("platforms", "0.0.11"), ("rules_cc", "0.1.1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Selection>()
    );
    assert!(protobuf.selection.dev.is_empty());
    assert_eq!(report.module("platforms@0.0.11").unwrap().rank, 3);
    assert_eq!(report.module("platforms@0.0.10").unwrap().rank, 1);
    assert_eq!(report.module("rules_cc@0.1.1").unwrap().rank, 2);
    assert_eq!(report.module("rules_cc@0.0.9").unwrap().rank, 0);
    assert_eq!(report.preferred_versions["rules_cc"], "0.1.1");

    assert_eq!(report.cycles.len(), 1);
    assert_eq!(report.cycles[0].name, "grpc-1.66.0+protobuf-29.0");
    assert_eq!(
        protobuf
            .dependencies
            .iter()
            .map(|d| d.target.clone())
            .collect::<Vec<_>>(),
        vec![
            DependencyTarget::Cycle("grpc-1.66.0+protobuf-29.0".to_string()),
            DependencyTarget::Module("rules_cc@0.1.1".to_string()),
            DependencyTarget::Override,
        ]
    );
    assert_eq!(report.unresolved, vec!["rules_python@0.3"]);

    // ========================================================================
    // Enrichment
    // ========================================================================

    repositories.assert_hits_async(1).await;
    gitlab.assert_hits_async(1).await;
    grpc_tag.assert_hits_async(0).await;
    docs.assert_hits_async(1).await;

    let enrichment = &report.enrichment;
    assert!(enrichment.backup_loaded);
    assert_eq!(enrichment.repositories.from_backup, 1);
    assert_eq!(enrichment.repositories.fetched, 3);
    assert_eq!(enrichment.repositories.not_found, 1);
    assert_eq!(enrichment.repositories.skipped, 1);
    assert_eq!(enrichment.commits_from_backup, 1);
    assert_eq!(enrichment.commits_resolved, 2);
    assert_eq!(enrichment.releases_added, 1);
    assert_eq!(enrichment.urls_probed, 1);

    let commit = |id: &str| report.module(id).unwrap().commit_sha.clone();
    assert_eq!(commit("protobuf@29.0").as_deref(), Some(PROTOBUF_SHA));
    assert_eq!(commit("grpc@1.66.0").as_deref(), Some(GRPC_SHA));
    assert_eq!(commit("platforms@0.0.11").as_deref(), Some(PLATFORMS_SHA));
    assert_eq!(commit("rules_cc@0.1.1").as_deref(), Some(RULES_CC_SHA));
    assert_eq!(commit("rules_cc@0.0.9"), None);

    assert_eq!(
        protobuf.docs_status.as_ref().map(|s| (s.code, s.exists())),
        Some((404, false))
    );

    assert_eq!(
        report
            .repositories
            .values()
            .map(|md| (md.identity(), md.primary_language.clone()))
            .collect::<Vec<_>>(),
        vec![
            ("github:bazelbuild/platforms".to_string(), Some("Starlark".to_string())),
            ("github:bazelbuild/rules_cc".to_string(), Some("Starlark".to_string())),
            ("github:protocolbuffers/protobuf".to_string(), Some("C++".to_string())),
            ("gitlab:org/proj".to_string(), Some("Starlark".to_string())),
        ]
    );
    let grpc = registry.module("grpc").unwrap();
    assert_eq!(grpc.repository_metadata, None);

    // ========================================================================
    // Persisted caches
    // ========================================================================

    assert!(saved.is_ok());
    assert!(matches!(
        saved.outcome("repository metadata"),
        Some(Ok(SaveOutcome::Written { records: 4 }))
    ));

    let repos = read_json(&dir.path().join("repository_metadata.json"));
    let names: Vec<&str> = repos["repository_metadata"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["platforms", "rules_cc", "protobuf", "proj"]);

    let releases = read_json(&dir.path().join("releases.json"));
    assert_eq!(releases["releases"][0]["version"], "8.0.0");

    let statuses = read_json(&dir.path().join("url_status.json"));
    assert_eq!(statuses["status"][0]["code"], 404);
}

#[tokio::test]
async fn test_offline_run_touches_no_network() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(500);
        })
        .await;

    let mut config = EngineConfig::default();
    config.backup.url = Some(server.url("/backup/registry.json.gz"));
    config.github.token = Some("test-token".to_string());
    config.github.graphql_url = server.url("/graphql");

    let mut registry = snapshot(&server.url("/docs/protobuf.html"));
    let mut ctx = ResolutionContext::new(config).offline(true);
    let report = ctx.resolve(&mut registry).await.unwrap();

    any.assert_hits_async(0).await;
    assert!(report.enrichment.offline);
    assert!(report.repositories.is_empty());
    assert_eq!(report.module("grpc@1.66.0").unwrap().commit_sha, None);
    assert_eq!(report.module("rules_cc@0.1.1").unwrap().rank, 2);
}
