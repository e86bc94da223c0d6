use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::actor::messages::{ChangeKind, ChangeSet};
use crate::config::SiteConfig;
use crate::utils::path::{relative_to, to_slash};

/// Where a watched path belongs.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Route {
    Config,
    Scope,
    /// Slash path relative to the source root
    Source(String),
    Skip,
}

pub(super) fn route(path: &Path, config: &SiteConfig) -> Route {
    if path == config.config_path {
        return Route::Config;
    }
    if path == config.scope_path() {
        return Route::Scope;
    }
    // The generator writes here; reacting would rebuild forever.
    if path.starts_with(config.destination_dir()) {
        return Route::Skip;
    }
    let Some(rel) = relative_to(path, config.source_dir()) else {
        return Route::Skip;
    };
    let hidden = rel.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden || rel.as_os_str().is_empty() {
        return Route::Skip;
    }
    Route::Source(to_slash(&rel))
}

/// Turn classified events into one change set for the build lane.
pub(super) fn to_change_set(
    changes: FxHashMap<PathBuf, ChangeKind>,
    config: &SiteConfig,
) -> ChangeSet {
    let mut set = ChangeSet::default();
    for (path, kind) in changes {
        match route(&path, config) {
            Route::Config => set.config = true,
            Route::Scope => set.scope = true,
            Route::Source(rel) => set.record(rel, kind),
            Route::Skip => crate::debug!("watch"; "skip {}", path.display()),
        }
    }
    set
}

pub(super) fn log_change_set(set: &ChangeSet) {
    if set.config {
        crate::log!("watch"; "config changed");
    }
    if set.scope {
        crate::debug!("watch"; "isolation scope changed");
    }
    for (path, kind) in &set.entries {
        crate::debug!("watch"; "{}: {}", kind.label(), path);
    }
}
