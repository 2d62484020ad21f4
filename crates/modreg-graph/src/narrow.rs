//! Version narrowing.
//!
//! Reduces a set of selected versions to one version per module. Versions
//! sharing a base (everything before the last `.`) whose last segment is a
//! number collapse to the highest patch first; versions without a numeric
//! last segment are compared as-is. The survivors are then reduced to the
//! largest by raw string comparison.

use std::collections::BTreeMap;

/// Narrow `selected` to one version per module name.
///
/// Keys are either bare module names or `name@version`; values are version
/// strings. The result is keyed by module name.
pub fn narrow_versions(selected: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    #[derive(Default)]
    struct Candidates<'a> {
        by_base: BTreeMap<&'a str, (u64, &'a str)>,
        unmerged: Vec<&'a str>,
    }

    let mut modules: BTreeMap<&str, Candidates<'_>> = BTreeMap::new();

    for (key, version) in selected {
        let version = version.as_str();
        let module = key.split_once('@').map_or(key.as_str(), |(name, _)| name);
        let candidates = modules.entry(module).or_default();

        match split_patch(version) {
            Some((base, patch)) => {
                let best = candidates.by_base.entry(base).or_insert((patch, version));
                if patch > best.0 {
                    *best = (patch, version);
                }
            }
            None => candidates.unmerged.push(version),
        }
    }

    modules
        .into_iter()
        .filter_map(|(module, candidates)| {
            candidates
                .by_base
                .into_values()
                .map(|(_, version)| version)
                .chain(candidates.unmerged)
                .max()
                .map(|version| (module.to_string(), version.to_string()))
        })
        .collect()
}

/// `"1.2.9"` -> `("1.2", 9)`. `None` when there is no `.` or the last
/// segment is not purely numeric.
fn split_patch(version: &str) -> Option<(&str, u64)> {
    let (base, last) = version.rsplit_once('.')?;
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    last.parse().ok().map(|patch| (base, patch))
}
