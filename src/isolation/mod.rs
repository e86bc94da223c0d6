//! Isolation scope: build only part of a site, grow it on demand.
//!
//! While `.isolation.toml` exists at the site root, the generator only sees
//! the pages the scope admits. The file is seeded by `hawkins isolate`,
//! widened by the HTTP layer when a browser asks for a page that was never
//! built, and removed when the session ends.
//!
//! ```toml
//! exclude = ["_posts/2024-01-01-hello.md", "about.md"]
//! include = ["*.css", "index.*", "hello.*"]
//! ```
//!
//! `include` wins over `exclude`: a page that is both bulk-excluded and
//! explicitly isolated is built.

mod matcher;
pub mod seed;
mod store;

pub use matcher::ScopeMatcher;
pub use store::{ScopeStore, Widen};

use crate::utils::path::basename_stem;
use matcher::literal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Scope file name, relative to the site root.
pub const SCOPE_FILE: &str = ".isolation.toml";

/// Persisted include/exclude pattern sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationScope {
    /// Source paths the generator skips.
    pub exclude: Vec<String>,
    /// Glob patterns admitted despite `exclude`.
    pub include: Vec<String>,
}

impl IsolationScope {
    /// Add `pattern` to `include`. Returns whether it was new.
    pub fn widen(&mut self, pattern: &str) -> bool {
        if self.includes(pattern) {
            return false;
        }
        self.include.push(pattern.to_string());
        true
    }

    pub fn includes(&self, pattern: &str) -> bool {
        self.include.iter().any(|p| p == pattern)
    }
}

/// Concatenate two lists, keeping the first occurrence of each entry.
pub fn merge(existing: &[String], computed: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + computed.len());
    for entry in existing.iter().chain(computed) {
        if !merged.contains(entry) {
            merged.push(entry.clone());
        }
    }
    merged
}

/// Name a page is isolated under. The site root is its `index` page.
pub fn page_stem(path: &str) -> &str {
    match basename_stem(path) {
        "" => "index",
        stem => stem,
    }
}

/// Wildcard admitting every output extension of the page at `path`.
///
/// `/2024/01/hello.html` and `_posts/hello.md` both map to `hello.*`.
/// Glob metacharacters in the name match literally.
pub fn page_pattern(path: &str) -> String {
    format!("{}.*", literal(page_stem(path)))
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("failed to access scope file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to serialize isolation scope")]
    Serialize(#[from] toml::ser::Error),
}
