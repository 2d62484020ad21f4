//! External enrichment of registry records
//!
//! Everything in this crate talks to the network and degrades instead of
//! failing: a missing backup, a failed batch or an unresolvable commit is
//! logged and leaves the affected records as they were.
//!
//! - [`BackupRegistry`]: prior registry export consulted before any provider
//! - [`RepositoryEnricher`]: batched GitHub/GitLab repository metadata
//! - [`CommitResolver`]: commit shas of GitHub source archives
//! - [`check_urls`]: `HEAD` liveness of source and docs URLs
//! - [`refresh_releases`]: release history of one repository

pub mod backup;
pub mod commits;
pub mod error;
pub mod github;
pub mod gitlab;
mod graphql;
pub mod http;
pub mod releases;
pub mod repositories;
pub mod source_url;
pub mod url_status;

pub use backup::BackupRegistry;
pub use commits::{CommitJob, CommitResolver, CommitSource, plan_commit_jobs, resolve_commit};
pub use error::{Error, Result};
pub use github::{GithubClient, GithubConfig};
pub use gitlab::{GitlabClient, GitlabConfig};
pub use releases::refresh_releases;
pub use repositories::{EnrichmentReport, MAX_BATCH, RepositoryEnricher, RepositorySource};
pub use source_url::{SourceUrl, SourceUrlKind};
pub use url_status::{HttpProbe, UrlProbe, check_urls, is_checkable};
