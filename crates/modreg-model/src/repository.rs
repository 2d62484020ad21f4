//! Source repository identity and hosting metadata

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hosting provider of a source repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    Github,
    Gitlab,
    #[default]
    Unknown,
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryType::Github => write!(f, "github"),
            RepositoryType::Gitlab => write!(f, "gitlab"),
            RepositoryType::Unknown => write!(f, "unknown"),
        }
    }
}

const PREFIXES: &[(&str, RepositoryType)] = &[
    ("github:", RepositoryType::Github),
    ("https://github.com/", RepositoryType::Github),
    ("http://github.com/", RepositoryType::Github),
    ("gitlab:", RepositoryType::Gitlab),
    ("https://gitlab.com/", RepositoryType::Gitlab),
    ("http://gitlab.com/", RepositoryType::Gitlab),
];

/// Hosting metadata of a repository, keyed by its canonical identity.
///
/// `languages == None` means the record has never been fetched. An empty map
/// is a fetched repository without detected languages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    #[serde(rename = "type", default)]
    pub kind: RepositoryType,
    pub organization: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub stargazers: u32,
    /// Language name to size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_language: Option<String>,
}

impl RepositoryMetadata {
    pub fn new(kind: RepositoryType, organization: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            organization: organization.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a repository reference from module metadata.
    ///
    /// Accepts `github:org/name`, `gitlab:org/name` and http(s) URLs on
    /// github.com or gitlab.com. A trailing `/` or `.git` and any query or
    /// fragment are dropped from the name. Anything else is `None`.
    pub fn parse(reference: &str) -> Option<Self> {
        let (rest, kind) = PREFIXES
            .iter()
            .find_map(|(prefix, kind)| reference.strip_prefix(*prefix).map(|rest| (rest, *kind)))?;

        let (organization, name) = rest.split_once('/')?;
        let name = name.strip_suffix('/').unwrap_or(name);
        let name = name.strip_suffix(".git").unwrap_or(name);
        let name = match name.find(['?', '#']) {
            Some(idx) => &name[..idx],
            None => name,
        };

        if organization.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(kind, organization, name))
    }

    /// Canonical identity, e.g. `github:org/name`.
    pub fn identity(&self) -> String {
        format!("{}:{}/{}", self.kind, self.organization, self.name)
    }

    /// `org/name`, the path on the hosting provider.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }

    pub fn is_fetched(&self) -> bool {
        self.languages.is_some()
    }

    /// Store a fetched language breakdown and derive the primary language.
    pub fn set_languages(&mut self, languages: BTreeMap<String, i64>) {
        self.primary_language = primary_language(&languages);
        self.languages = Some(languages);
    }

    /// Copy fetched fields from another record of the same repository.
    ///
    /// Only non-empty values are taken; language maps are merged.
    pub fn absorb(&mut self, other: &RepositoryMetadata) {
        if !other.description.is_empty() {
            self.description = other.description.clone();
        }
        if other.stargazers > 0 {
            self.stargazers = other.stargazers;
        }
        if let Some(langs) = other.languages.as_ref().filter(|l| !l.is_empty()) {
            let merged = self.languages.get_or_insert_with(BTreeMap::new);
            merged.extend(langs.iter().map(|(k, v)| (k.clone(), *v)));
        }
        if let Some(primary) = other.primary_language.as_ref().filter(|p| !p.is_empty()) {
            self.primary_language = Some(primary.clone());
        }
        if let Some(canonical) = other.canonical_name.as_ref().filter(|c| !c.is_empty()) {
            self.canonical_name = Some(canonical.clone());
        }
    }
}

/// The language with the largest size; ties go to the smallest name.
pub fn primary_language(languages: &BTreeMap<String, i64>) -> Option<String> {
    let mut best: Option<(&String, i64)> = None;
    for (name, size) in languages {
        if best.is_none_or(|(_, top)| *size > top) {
            best = Some((name, *size));
        }
    }
    best.map(|(name, _)| name.clone())
}

/// Canonical identity of a repository reference, or the reference itself if
/// it cannot be parsed.
pub fn canonical_identity(reference: &str) -> String {
    match RepositoryMetadata::parse(reference) {
        Some(md) => md.identity(),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("github:boostorg/qvm", RepositoryType::Github, "boostorg", "qvm")]
    #[case("https://github.com/tweag/rules_sh", RepositoryType::Github, "tweag", "rules_sh")]
    #[case("http://github.com/Vertexwahn/rules_qt6", RepositoryType::Github, "Vertexwahn", "rules_qt6")]
    #[case("github:google/snappy/", RepositoryType::Github, "google", "snappy")]
    #[case("github:bazelbuild/bazel-skylib.git", RepositoryType::Github, "bazelbuild", "bazel-skylib")]
    #[case("github:google/re2?ref=main", RepositoryType::Github, "google", "re2")]
    #[case("github:abseil/abseil-cpp#hash", RepositoryType::Github, "abseil", "abseil-cpp")]
    #[case("gitlab:arm-bazel/ape", RepositoryType::Gitlab, "arm-bazel", "ape")]
    #[case("https://gitlab.com/group/sub/project", RepositoryType::Gitlab, "group", "sub/project")]
    fn test_parse(
        #[case] input: &str,
        #[case] kind: RepositoryType,
        #[case] org: &str,
        #[case] name: &str,
    ) {
        let md = RepositoryMetadata::parse(input).unwrap();
        assert_eq!(md.kind, kind);
        assert_eq!(md.organization, org);
        assert_eq!(md.name, name);
    }

    #[rstest]
    #[case("")]
    #[case("github:")]
    #[case("github:google")]
    #[case("https://download.redis.io/releases")]
    #[case("https://gitlab.arm.com/bazel/ape")]
    #[case("https://sqlite.org")]
    fn test_parse_rejects(#[case] input: &str) {
        assert_eq!(RepositoryMetadata::parse(input), None);
    }

    #[test]
    fn test_identity() {
        let md = RepositoryMetadata::parse("https://github.com/bazelbuild/rules_go.git").unwrap();
        assert_eq!(md.identity(), "github:bazelbuild/rules_go");
        assert_eq!(
            RepositoryMetadata::new(RepositoryType::Unknown, "o", "n").identity(),
            "unknown:o/n"
        );
        assert_eq!(canonical_identity("gitlab:a/b/"), "gitlab:a/b");
        assert_eq!(canonical_identity("https://zlib.net"), "https://zlib.net");
    }

    #[test]
    fn test_fetched_sentinel() {
        let mut md = RepositoryMetadata::new(RepositoryType::Github, "o", "n");
        assert!(!md.is_fetched());
        md.set_languages(BTreeMap::new());
        assert!(md.is_fetched());
        assert_eq!(md.primary_language, None);
    }

    #[test]
    fn test_primary_language_largest_wins() {
        let langs = BTreeMap::from([
            ("C++".to_string(), 900),
            ("Starlark".to_string(), 4000),
            ("Python".to_string(), 4000),
        ]);
        assert_eq!(primary_language(&langs), Some("Python".to_string()));
    }

    #[test]
    fn test_absorb_skips_empty_fields() {
        let mut md = RepositoryMetadata::new(RepositoryType::Github, "o", "n");
        md.description = "kept".to_string();
        md.stargazers = 7;

        let mut other = RepositoryMetadata::new(RepositoryType::Github, "o", "n");
        other.languages = Some(BTreeMap::from([("Go".to_string(), 10)]));
        other.primary_language = Some("Go".to_string());
        md.absorb(&other);

        assert_eq!(md.description, "kept");
        assert_eq!(md.stargazers, 7);
        assert_eq!(md.languages, Some(BTreeMap::from([("Go".to_string(), 10)])));
        assert_eq!(md.primary_language.as_deref(), Some("Go"));
    }

    #[test]
    fn test_unfetched_record_omits_languages_when_serialized() {
        let md = RepositoryMetadata::new(RepositoryType::Github, "o", "n");
        let json = serde_json::to_string(&md).unwrap();
        assert!(!json.contains("languages"));

        let mut fetched = md.clone();
        fetched.set_languages(BTreeMap::new());
        let back: RepositoryMetadata =
            serde_json::from_str(&serde_json::to_string(&fetched).unwrap()).unwrap();
        assert!(back.is_fetched());
    }
}
