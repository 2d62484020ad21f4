//! Module version identifiers (`name@version`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical `name@version` identifier of one module version.
///
/// Ordering is the raw string ordering of the full identifier. Versions are
/// never interpreted semantically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId {
    id: String,
    at: usize,
}

impl ModuleId {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            id: format!("{}@{}", name, version),
            at: name.len(),
        }
    }

    /// Parse `name@version`, splitting on the first `@`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => Ok(Self {
                id: s.to_string(),
                at: name.len(),
            }),
            _ => Err(Error::InvalidModuleId { id: s.to_string() }),
        }
    }

    pub fn name(&self) -> &str {
        &self.id[..self.at]
    }

    pub fn version(&self) -> &str {
        &self.id[self.at + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// The id with `@` replaced by `-`, as used inside cycle names.
    pub fn cycle_segment(&self) -> String {
        self.id.replace('@', "-")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for ModuleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.id
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.id
    }
}
