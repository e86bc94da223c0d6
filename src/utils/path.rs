//! Path normalization utilities.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Path of `path` relative to `root`, or `None` when it lies outside.
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Render a relative path with `/` separators, as used in scope patterns
/// and URL paths.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// File stem of the last path segment (`/foo/bar.html` -> `bar`).
pub fn basename_stem(path: &str) -> &str {
    let name = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_relative_to() {
        let rel = relative_to(Path::new("/site/_posts/a.md"), Path::new("/site"));
        assert_eq!(rel, Some(PathBuf::from("_posts/a.md")));
        assert_eq!(relative_to(Path::new("/other/a.md"), Path::new("/site")), None);
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("a/b/c.html")), "a/b/c.html");
        assert_eq!(to_slash(Path::new("./a/index.html")), "a/index.html");
    }

    #[test]
    fn test_basename_stem() {
        assert_eq!(basename_stem("/foo/bar"), "bar");
        assert_eq!(basename_stem("foo/bar.html"), "bar");
        assert_eq!(basename_stem("/2016/01/post.tar.gz"), "post.tar");
        assert_eq!(basename_stem("/blog/"), "blog");
        assert_eq!(basename_stem(".htaccess"), ".htaccess");
    }
}
