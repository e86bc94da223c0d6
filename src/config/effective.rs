//! Effective generator configuration.
//!
//! A `BuildConfig` is derived from the host config plus the isolation scope
//! (when one exists) and never mutated afterwards. When either input changes
//! the build lane derives a fresh value and swaps it in.

use super::SiteConfig;
use crate::isolation::{IsolationScope, merge};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub drafts: bool,
    pub future: bool,
    /// Scope include patterns, empty outside isolation mode.
    pub include: Vec<String>,
    /// Host excludes, plus scope excludes in isolation mode.
    pub exclude: Vec<String>,
    /// Renderable file name pattern.
    pub content: Regex,
    /// Generator command line, before placeholder substitution.
    pub command: Vec<String>,
}

impl BuildConfig {
    pub fn resolve(site: &SiteConfig, scope: Option<&IsolationScope>) -> Result<Self> {
        let content = site
            .build
            .content_pattern()
            .context("invalid `build.extensions`")?;

        let (include, exclude) = match scope {
            Some(scope) => (
                scope.include.clone(),
                merge(&site.build.exclude, &scope.exclude),
            ),
            None => (Vec::new(), site.build.exclude.clone()),
        };

        Ok(Self {
            source: site.build.source.clone(),
            destination: site.build.destination.clone(),
            drafts: site.build.drafts,
            future: site.build.future,
            include,
            exclude,
            content,
            command: site.build.command.clone(),
        })
    }
}
