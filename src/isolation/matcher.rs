//! Compiled include/exclude sets.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fmt;

/// Decides whether a source-relative path takes part in a build.
#[derive(Clone)]
pub struct ScopeMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl fmt::Debug for ScopeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeMatcher")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.len())
            .finish()
    }
}

impl ScopeMatcher {
    /// Compile pattern lists. An include entry that is not a valid glob is
    /// logged and skipped.
    ///
    /// Exclude entries are literal source paths. Each also covers
    /// everything below it, so excluding `vendor` excludes `vendor/lib.js`.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_globset(include.iter().map(String::as_str))?;
        let exclude = build_globset(exclude.iter().flat_map(|path| {
            let exact = literal(path.trim_end_matches('/'));
            [format!("{exact}/**"), exact]
        }))?;
        Ok(Self { include, exclude })
    }

    /// Whether `rel_path` (slash-separated, relative to the source root)
    /// is built. Include patterns match either the whole path or its
    /// file name and always win over exclusion.
    pub fn admits(&self, rel_path: &str) -> bool {
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        if self.include.is_match(rel_path) || self.include.is_match(name) {
            return true;
        }
        !self.exclude.is_match(rel_path)
    }
}

/// Glob matching `text` exactly. Braces are escaped along with the
/// metacharacters `globset::escape` covers.
pub fn literal(text: &str) -> String {
    globset::escape(text).replace('{', "[{]").replace('}', "[}]")
}

fn build_globset<I, S>(patterns: I) -> Result<GlobSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.as_ref();
        match Glob::new(pat) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => crate::log!("scope"; "ignoring invalid pattern `{}`: {}", pat, e),
        }
    }
    builder.build().context("failed to compile scope patterns")
}
