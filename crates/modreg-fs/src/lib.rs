//! Filesystem helpers for the module registry resolver
//!
//! Provides atomic, lock-guarded writes for persisted caches and reports, and
//! environment expansion for configured file locations.

pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use io::{read_bytes, read_text, write_atomic, write_text};
pub use path::expand_env;
