//! `[build]` section configuration.
//!
//! Describes the external generator and the directories it works on.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "."                # Site source root (relative to the config file)
//! destination = "_site"       # Generated output directory
//! command = ["jekyll", "build", "--config", "_config.yml,$SITE_OVERLAY"]
//! extensions = ["adoc"]       # Extra renderable extensions
//! drafts = false              # Render drafts
//! future = false              # Render future-dated posts
//! exclude = ["vendor"]        # Never built, also seeds the isolation exclude list
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extensions the generator always renders.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown", "mkd", "mkdn", "html", "htm", "textile"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Site source directory.
    pub source: PathBuf,

    /// Generator output directory.
    pub destination: PathBuf,

    /// Generator command line. `$SITE_*` placeholders are substituted per build.
    pub command: Vec<String>,

    /// Additional renderable extensions (without the leading dot).
    pub extensions: Vec<String>,

    /// Render draft posts.
    pub drafts: bool,

    /// Render posts dated in the future.
    pub future: bool,

    /// Paths the generator never processes.
    pub exclude: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            destination: PathBuf::from("_site"),
            command: ["jekyll", "build", "--config", "_config.yml,$SITE_OVERLAY"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            extensions: Vec::new(),
            drafts: false,
            future: false,
            exclude: Vec::new(),
        }
    }
}

impl BuildSection {
    /// All renderable extensions, defaults first, without duplicates.
    pub fn all_extensions(&self) -> Vec<String> {
        let mut all: Vec<String> = DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect();
        for ext in &self.extensions {
            let ext = ext.trim_start_matches('.').to_string();
            if !ext.is_empty() && !all.contains(&ext) {
                all.push(ext);
            }
        }
        all
    }

    /// Case-insensitive pattern matching renderable file names.
    pub fn content_pattern(&self) -> Result<Regex, regex::Error> {
        let alternatives = self
            .all_extensions()
            .iter()
            .map(|ext| format!(r"\.{}$", regex::escape(ext)))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i){alternatives}"))
    }
}
