//! Path patterns accepted by `add`
//!
//! - `.`, `*` or an empty pattern match every path
//! - a pattern naming a directory matches everything below it
//! - anything else is a glob (`*`, `?`, `[...]`, `**`) matched against the
//!   whole `/`-separated path, where `*` may cross directory boundaries

use crate::artifacts::core::error::{Error, Result};
use glob::Pattern;

#[derive(Debug, Clone)]
enum Matcher {
    All,
    Prefix(String),
    Glob(Pattern),
}

/// One compiled pattern
#[derive(Debug, Clone)]
pub struct Pathspec {
    raw: String,
    matcher: Matcher,
}

impl Pathspec {
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');

        let matcher = match trimmed {
            "" | "." | "*" | "**" => Matcher::All,
            _ if !trimmed.contains(['*', '?', '[']) => Matcher::Prefix(trimmed.to_string()),
            _ => Matcher::Glob(
                Pattern::new(trimmed)
                    .map_err(|e| Error::invalid_argument("add_all", pattern, e.msg))?,
            ),
        };

        Ok(Pathspec {
            raw: pattern.to_string(),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Prefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            // a glob naming a directory selects everything below it
            Matcher::Glob(pattern) => {
                pattern.matches(path)
                    || path
                        .match_indices('/')
                        .any(|(position, _)| pattern.matches(&path[..position]))
            }
        }
    }
}

/// Set of patterns; a path is selected when any of them matches
#[derive(Debug, Clone, Default)]
pub struct PathspecSet {
    specs: Vec<Pathspec>,
}

impl PathspecSet {
    /// Compile every pattern, failing on the first invalid one
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let specs = patterns
            .iter()
            .map(|pattern| Pathspec::parse(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(PathspecSet { specs })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.specs.iter().any(|spec| spec.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
