//! Shared test fixtures for the module registry workspace.
//!
//! - [`RegistryBuilder`]: assemble a [`Registry`] snapshot in a few lines
//! - [`write_registry`]: persist a snapshot into a temporary directory

pub mod registry;

pub use registry::{RegistryBuilder, write_registry};

pub use modreg_model::Registry;
