//! Initial scope for `hawkins isolate`.
//!
//! Every page the generator would render is excluded, then the requested
//! pages and the assets most layouts need are included back.

use super::{IsolationScope, merge, page_pattern};
use crate::{
    config::SiteConfig,
    utils::path::{relative_to, to_slash},
};
use anyhow::{Context, Result, bail};
use globset::GlobBuilder;
use jwalk::WalkDir;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Assets and entry points every isolated session keeps.
pub const DEFAULT_INCLUDE: &[&str] = &["*.less", "*.js", "*.css", "*.png", "404.html", "index.*"];

/// Leading `---` block, the marker of a page the generator renders.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)\A(---\s*\n.*?\n?)^(---\s*$\n?)").unwrap()
});

/// Build the scope isolating `globs` (relative to the source directory).
pub fn seed(config: &SiteConfig, globs: &[String]) -> Result<IsolationScope> {
    let source = config.source_dir();
    let files = source_files(source, config.destination_dir());

    let content = config.build.content_pattern()?;
    let pages: Vec<String> = files
        .iter()
        .filter(|rel| content.is_match(rel))
        .filter(|rel| has_front_matter(&source.join(rel.as_str())))
        .cloned()
        .collect();
    crate::debug!("isolate"; "{} renderable pages excluded", pages.len());

    let mut scope = IsolationScope {
        exclude: merge(&pages, &config.build.exclude),
        include: DEFAULT_INCLUDE.iter().map(ToString::to_string).collect(),
    };

    for glob in globs {
        let matcher = GlobBuilder::new(glob.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob: {glob}"))?
            .compile_matcher();

        let matches: Vec<&String> = files.iter().filter(|rel| matcher.is_match(rel.as_str())).collect();
        if matches.is_empty() {
            bail!("Could not find any matches for {glob}.");
        }
        for rel in matches {
            scope.widen(&page_pattern(rel));
        }
    }

    Ok(scope)
}

/// Source files as sorted slash paths, skipping the destination tree and
/// hidden directories.
fn source_files(source: &Path, destination: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(source)
        .skip_hidden(false)
        .process_read_dir({
            let destination = destination.to_path_buf();
            move |_, _, _, children| {
                children.retain(|entry| {
                    entry.as_ref().is_ok_and(|e| {
                        let hidden_dir =
                            e.file_type().is_dir() && e.file_name().to_string_lossy().starts_with('.');
                        !hidden_dir && e.path() != destination
                    })
                });
            }
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| relative_to(&e.path(), source).map(|p: PathBuf| to_slash(&p)))
        .collect();
    files.sort();
    files
}

fn has_front_matter(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|content| FRONT_MATTER.is_match(&content))
}
