//! Registry data model
//!
//! Plain records produced by the registry parser and consumed by the
//! resolver:
//!
//! ```text
//! Registry
//!   └── Module (one per name)
//!         ├── ModuleMetadata   versions oldest -> newest, repositories
//!         ├── ModuleVersion*   deps, source, presubmit, attestations
//!         └── RepositoryMetadata (enriched)
//! ```
//!
//! Records are immutable for the duration of a resolution run except for the
//! enrichment fields (`commit_sha`, URL statuses, repository metadata).

pub mod error;
pub mod id;
pub mod metadata;
pub mod module;
pub mod registry;
pub mod release;
pub mod repository;
pub mod status;

pub use error::{Error, Result};
pub use id::ModuleId;
pub use metadata::{Maintainer, ModuleMetadata};
pub use module::{
    Attestations, Dependency, ModuleCommit, ModuleSource, ModuleVersion, Override, Presubmit,
};
pub use registry::{Module, Registry};
pub use release::Release;
pub use repository::{RepositoryMetadata, RepositoryType, canonical_identity};
pub use status::UrlStatus;
