//! Records that can live in a [`RecordCache`](crate::RecordCache).

use serde::Serialize;
use serde::de::DeserializeOwned;

use modreg_model::{Release, RepositoryMetadata, UrlStatus};

/// A cached record keyed by its own identity field.
pub trait CacheRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the record array in the cache file
    const COLLECTION: &'static str;

    fn cache_key(&self) -> String;
}

impl CacheRecord for Release {
    const COLLECTION: &'static str = "releases";

    fn cache_key(&self) -> String {
        self.version.clone()
    }
}

impl CacheRecord for RepositoryMetadata {
    const COLLECTION: &'static str = "repository_metadata";

    fn cache_key(&self) -> String {
        self.identity()
    }
}

impl CacheRecord for UrlStatus {
    const COLLECTION: &'static str = "status";

    fn cache_key(&self) -> String {
        self.url.clone()
    }
}
