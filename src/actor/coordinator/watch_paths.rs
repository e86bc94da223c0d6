use std::path::{Path, PathBuf};

use crate::config::SiteConfig;

/// Recursive watch roots for a serve session.
///
/// The site root covers the config file, the scope file and (usually) the
/// source tree. A source directory outside the root is watched on its own.
pub(super) fn collect_watch_paths(config: &SiteConfig) -> Vec<PathBuf> {
    let root = config.get_root().to_path_buf();
    let source = config.source_dir().to_path_buf();

    let mut paths = vec![root];
    if !source.starts_with(&paths[0]) {
        paths.push(source);
    }
    dedupe_nested(&mut paths);
    paths
}

/// Drop roots already covered by another recursive root.
fn dedupe_nested(paths: &mut Vec<PathBuf>) {
    let snapshot = paths.clone();
    paths.retain(|path| !snapshot.iter().any(|other| is_strict_ancestor(other, path)));
}

fn is_strict_ancestor(ancestor: &Path, path: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}
