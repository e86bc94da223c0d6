//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/_posts/drafts/  ← start
/// /home/user/site/hawkins.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("_posts/drafts");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("hawkins.toml"), "").unwrap();

        let found = find_config_file(Path::new("hawkins.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("hawkins.toml"));
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("hawkins.toml"), "").unwrap();
        fs::write(nested.join("hawkins.toml"), "").unwrap();

        let found = find_config_file(Path::new("hawkins.toml"), &nested).unwrap();
        assert_eq!(found, nested.join("hawkins.toml"));
    }

    #[test]
    fn test_find_config_absolute_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(find_config_file(&missing, dir.path()).is_none());
    }

    #[test]
    fn test_directory_is_not_a_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/hawkins.toml")).unwrap();
        let found = find_config_file(Path::new("hawkins.toml"), &dir.path().join("a"));
        // a directory named like the config never matches
        assert!(found.is_none_or(|p| p.is_file()));
    }
}
