//! Expansion of environment references in configured paths

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap()
});

/// Replace `$VAR` and `${VAR}` with the value of the environment variable.
///
/// Unset variables expand to the empty string.
pub fn expand_env(input: &str) -> Cow<'_, str> {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Same as [`expand_env`] with a caller-supplied variable lookup.
pub fn expand_with<F>(input: &str, lookup: F) -> Cow<'_, str>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_REF.replace_all(input, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        lookup(name).unwrap_or_default()
    })
}
