//! Generator invocation and file-for-file passthrough.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use regex::Regex;

use crate::actor::messages::ChangeSet;
use crate::config::BuildConfig;
use crate::generator::{BuildError, Generator, output_pages};
use crate::isolation::ScopeMatcher;
use crate::logger::{status_error, status_success, status_unchanged};
use crate::reload::classify::classify;

/// Outcome of one lane cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub elapsed: Duration,
    /// Output pages (`/a/index.html`) whose content changed, oldest write first
    pub changed_pages: Vec<String>,
    pub failed: bool,
}

impl BuildResult {
    fn failure(elapsed: Duration) -> Self {
        Self {
            elapsed,
            changed_pages: Vec::new(),
            failed: true,
        }
    }
}

/// What a change set needs.
#[derive(Debug, PartialEq, Eq)]
pub enum Plan {
    /// One generator pass over the whole site
    Rebuild,
    /// Static files only, no generator
    Passthrough { copy: Vec<String>, remove: Vec<String> },
    Nothing,
}

/// Decide the work for a change set. Any renderable path, or a change to the
/// host config or scope, means a full rebuild that subsumes static copies.
pub fn plan(changes: &ChangeSet, content: &Regex) -> Plan {
    if changes.config || changes.scope || classify(changes.paths(), content).needs_build() {
        return Plan::Rebuild;
    }
    let copy = classify(changes.added().chain(changes.modified()), content).passthrough;
    let remove = classify(changes.removed(), content).passthrough;
    if copy.is_empty() && remove.is_empty() {
        Plan::Nothing
    } else {
        Plan::Passthrough { copy, remove }
    }
}

/// Owns the generator. Never shared: the build lane moves it into one
/// blocking task at a time.
pub struct BuildRunner<G> {
    generator: G,
}

impl<G: Generator> BuildRunner<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Run the generator once and report the pages it actually changed.
    pub fn trigger(&mut self, config: &BuildConfig) -> BuildResult {
        let start = Instant::now();
        if let Err(err) = self.generator.process(config) {
            status_error("build failed", &format!("{:#}", anyhow::Error::from(err)));
            return BuildResult::failure(start.elapsed());
        }

        let changed_pages = self.changed_pages(&config.destination);
        let elapsed = start.elapsed();
        match changed_pages.len() {
            0 => status_unchanged(&format!("rebuilt in {}, no pages changed", fmt_ms(elapsed))),
            n => status_success(&format!("rebuilt {n} page(s) in {}", fmt_ms(elapsed))),
        }
        BuildResult {
            elapsed,
            changed_pages,
            failed: false,
        }
    }

    /// Changed output pages in write order (mtime, then path).
    fn changed_pages(&self, destination: &Path) -> Vec<String> {
        let mut pages: Vec<(SystemTime, String)> = output_pages(destination)
            .into_iter()
            .filter(|page| self.generator.regenerate(page))
            .map(|page| {
                let mtime = fs::metadata(destination.join(page.trim_start_matches('/')))
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, page)
            })
            .collect();
        pages.sort();
        pages.into_iter().map(|(_, page)| page).collect()
    }

    /// Copy static files into the destination. Returns the copied output
    /// pages. Files outside the current scope are skipped.
    pub fn copy(&self, config: &BuildConfig, paths: &[String]) -> Result<Vec<String>, BuildError> {
        let matcher = ScopeMatcher::new(&config.include, &config.exclude)?;
        let mut copied = Vec::new();

        for rel in paths {
            if !matcher.admits(rel) {
                crate::debug!("build"; "out of scope, not copied: {}", rel);
                continue;
            }
            let from = config.source.join(rel);
            let to = config.destination.join(rel);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::Io(parent.to_path_buf(), e))?;
            }
            fs::copy(&from, &to).map_err(|e| BuildError::Io(from.clone(), e))?;
            copied.push(format!("/{rel}"));
        }
        Ok(copied)
    }

    /// Delete static files from the destination, pruning directories left
    /// empty. Returns how many entries were removed.
    pub fn remove(&self, config: &BuildConfig, paths: &[String]) -> Result<usize, BuildError> {
        let mut removed = 0;
        for rel in paths {
            let target = config.destination.join(rel);
            let result = if target.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(BuildError::Io(target, e)),
            }
            prune_empty_parents(&target, &config.destination);
        }
        Ok(removed)
    }

    /// Carry out a plan.
    pub fn dispatch(&mut self, config: &BuildConfig, plan: Plan) -> BuildResult {
        match plan {
            Plan::Rebuild => self.trigger(config),
            Plan::Passthrough { copy, remove } => {
                let start = Instant::now();
                let outcome = self
                    .remove(config, &remove)
                    .and_then(|removed| Ok((removed, self.copy(config, &copy)?)));
                let elapsed = start.elapsed();
                match outcome {
                    Ok((removed, copied)) => {
                        status_success(&format!(
                            "copied {}, removed {} in {}",
                            copied.len(),
                            removed,
                            fmt_ms(elapsed)
                        ));
                        BuildResult {
                            elapsed,
                            changed_pages: copied,
                            failed: false,
                        }
                    }
                    Err(err) => {
                        status_error("copy failed", &format!("{:#}", anyhow::Error::from(err)));
                        BuildResult::failure(elapsed)
                    }
                }
            }
            Plan::Nothing => BuildResult::default(),
        }
    }
}

/// Remove empty directories from `path`'s parent up to (excluding) `root`.
fn prune_empty_parents(path: &Path, root: &Path) {
    let mut dir = path.parent();
    while let Some(current) = dir {
        if current == root || !current.starts_with(root) {
            break;
        }
        // fails on non-empty directories, which ends the walk
        if fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
}

fn fmt_ms(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}
