//! Persisted caches
//!
//! Three independent collections survive between runs:
//!
//! | cache               | key                  | saved            |
//! |---------------------|----------------------|------------------|
//! | release history     | release version      | only when dirty  |
//! | repository metadata | canonical identity   | only when dirty  |
//! | URL status          | URL                  | always           |
//!
//! Loading is best effort and merges into whatever is already in memory.
//! Saving writes records sorted by key, atomically.

pub mod cache;
pub mod error;
pub mod record;
pub mod set;

pub use cache::{RecordCache, SaveOutcome, SavePolicy};
pub use error::{Error, Result};
pub use record::CacheRecord;
pub use set::{CachePaths, CacheSaveReport, Caches};

pub type ReleaseCache = RecordCache<modreg_model::Release>;
pub type RepositoryMetadataCache = RecordCache<modreg_model::RepositoryMetadata>;
pub type UrlStatusCache = RecordCache<modreg_model::UrlStatus>;
