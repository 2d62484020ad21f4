//! Classification of GitHub source archive URLs

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static TAG_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/archive/refs/tags/([^/]+)\.(tar\.gz|zip)$").unwrap()
});

static COMMIT_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/archive/([a-f0-9]{40})\.(tar\.gz|zip)$").unwrap()
});

static RELEASE_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/releases/download/([^/]+)/[^/]+$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceUrlKind {
    /// `archive/refs/tags/{tag}.tar.gz`
    Tag,
    /// `archive/{sha}.tar.gz`
    Commit,
    /// `releases/download/{tag}/{asset}`
    Release,
}

impl fmt::Display for SourceUrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUrlKind::Tag => write!(f, "tag"),
            SourceUrlKind::Commit => write!(f, "commit_sha"),
            SourceUrlKind::Release => write!(f, "release"),
        }
    }
}

/// A source URL pointing at a GitHub repository revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl {
    pub kind: SourceUrlKind,
    pub organization: String,
    pub repository: String,
    /// Tag name, commit sha or release tag
    pub reference: String,
}

impl SourceUrl {
    /// Classify `url`; `None` for anything that is not a recognized GitHub
    /// archive or release asset.
    pub fn parse(url: &str) -> Option<Self> {
        let patterns = [
            (&*TAG_ARCHIVE, SourceUrlKind::Tag),
            (&*COMMIT_ARCHIVE, SourceUrlKind::Commit),
            (&*RELEASE_ASSET, SourceUrlKind::Release),
        ];
        patterns.into_iter().find_map(|(pattern, kind)| {
            let caps = pattern.captures(url)?;
            let reference = &caps[3];
            let reference = match kind {
                SourceUrlKind::Tag => reference.strip_suffix(".tar.gz").unwrap_or(reference),
                _ => reference,
            };
            Some(Self {
                kind,
                organization: caps[1].to_string(),
                repository: caps[2].to_string(),
                reference: reference.to_string(),
            })
        })
    }

    /// `org/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://github.com/google/glog/archive/refs/tags/v0.7.1.tar.gz",
        SourceUrlKind::Tag,
        "google",
        "glog",
        "v0.7.1"
    )]
    #[case(
        "https://github.com/grpc/grpc/archive/refs/tags/v1.41.0.zip",
        SourceUrlKind::Tag,
        "grpc",
        "grpc",
        "v1.41.0"
    )]
    #[case(
        "https://github.com/boostorg/smart_ptr/archive/refs/tags/boost-1.87.0.tar.gz",
        SourceUrlKind::Tag,
        "boostorg",
        "smart_ptr",
        "boost-1.87.0"
    )]
    #[case(
        "https://github.com/grpc/grpc/archive/b73dbd94df4bd9f9362d16b76f34e4c7c2358409.tar.gz",
        SourceUrlKind::Commit,
        "grpc",
        "grpc",
        "b73dbd94df4bd9f9362d16b76f34e4c7c2358409"
    )]
    #[case(
        "https://github.com/fmeum/rules_jni/releases/download/v0.11.1/rules_jni-v0.11.1.tar.gz",
        SourceUrlKind::Release,
        "fmeum",
        "rules_jni",
        "v0.11.1"
    )]
    #[case(
        "https://github.com/sergeykhliustin/BazelPods/releases/download/1.12.5/release.tar.gz",
        SourceUrlKind::Release,
        "sergeykhliustin",
        "BazelPods",
        "1.12.5"
    )]
    fn test_parse(
        #[case] url: &str,
        #[case] kind: SourceUrlKind,
        #[case] org: &str,
        #[case] repo: &str,
        #[case] reference: &str,
    ) {
        let parsed = SourceUrl::parse(url).unwrap();
        assert_eq!(parsed.kind, kind);
        assert_eq!(parsed.organization, org);
        assert_eq!(parsed.repository, repo);
        assert_eq!(parsed.reference, reference);
    }

    #[rstest]
    #[case("https://example.com/foo/bar.tar.gz")]
    #[case("https://github.com/foo/bar/blob/main/file.txt")]
    #[case("https://github.com/foo")]
    #[case("https://gitlab.com/foo/bar/-/archive/v1/bar-v1.tar.gz")]
    fn test_unrecognized(#[case] url: &str) {
        assert_eq!(SourceUrl::parse(url), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SourceUrlKind::Commit.to_string(), "commit_sha");
    }
}
