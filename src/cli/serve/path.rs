//! URL to filesystem path resolution.

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Resolve a request URL to a file in `serve_root`.
///
/// Lookup order for `/name`: the file itself, `name/index.html`, then
/// `name.html` (extensionless URLs). Anything escaping `serve_root`
/// resolves to `None`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);
    let wants_dir = url.split('?').next().unwrap_or(url).ends_with('/');

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    let root = serve_root.canonicalize().ok()?;
    let local = root.join(&clean);

    if let Some(found) = existing_file(&local, &root) {
        return Some(found);
    }
    if local.is_dir()
        && let Some(found) = existing_file(&local.join("index.html"), &root)
    {
        return Some(found);
    }
    if clean.is_empty() || wants_dir {
        return None;
    }
    existing_file(&root.join(format!("{clean}.html")), &root)
}

/// Canonical path of a regular file under `root`. Canonicalizing also
/// catches symlinks that point outside the tree.
fn existing_file(path: &Path, root: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    (canonical.starts_with(root) && canonical.is_file()).then_some(canonical)
}

/// Normalize URL: strip query string, decode, trim slashes
fn normalize_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}

/// Percent-decoded path part of `url`, the name a page has on disk.
pub fn decode_path(url: &str) -> Cow<'_, str> {
    let path = url.split('?').next().unwrap_or(url);
    percent_decode_str(path).decode_utf8_lossy()
}
