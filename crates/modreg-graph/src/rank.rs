//! Ranking module versions by how often selection picks them.

use std::collections::BTreeMap;

use modreg_model::ModuleId;

use crate::mvs::{PerRootSelections, Selection};
use crate::narrow::narrow_versions;

/// A root's selection without the root module's own entry.
pub fn without_root(root: &ModuleId, selection: &Selection) -> Selection {
    selection
        .iter()
        .filter(|(name, _)| name.as_str() != root.name())
        .map(|(name, version)| (name.clone(), version.clone()))
        .collect()
}

/// Number of other roots whose selection picked each module version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    ranks: BTreeMap<ModuleId, u32>,
}

impl Ranking {
    pub fn from_selections(per_root: &PerRootSelections) -> Self {
        let mut ranks: BTreeMap<ModuleId, u32> = BTreeMap::new();
        for (root, selection) in per_root {
            for (name, version) in without_root(root, selection) {
                *ranks.entry(ModuleId::new(&name, &version)).or_default() += 1;
            }
        }
        Self { ranks }
    }

    pub fn rank(&self, id: &ModuleId) -> u32 {
        self.ranks.get(id).copied().unwrap_or_default()
    }

    /// Module versions with a rank above zero, sorted by id.
    pub fn ranked(&self) -> impl Iterator<Item = (&ModuleId, u32)> {
        self.ranks
            .iter()
            .filter(|(_, rank)| **rank > 0)
            .map(|(id, rank)| (id, *rank))
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// One preferred version per ranked module, after narrowing.
    pub fn preferred_versions(&self) -> BTreeMap<String, String> {
        let selected: BTreeMap<String, String> = self
            .ranked()
            .map(|(id, _)| (id.to_string(), id.version().to_string()))
            .collect();
        narrow_versions(&selected)
    }
}
