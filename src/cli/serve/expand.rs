//! On-demand isolation widening.
//!
//! A miss for a page the scope left out adds `<basename>.*` to the scope
//! file and answers with a holding page. The watcher sees the scope change
//! and rebuilds. A second miss for the same pattern means the generator
//! already had its chance, so it is a plain 404.

use std::path::PathBuf;
use std::sync::Arc;

use super::response::{self, Reply};
use crate::embed::serve::{HOLDING_HTML, HoldingVars};
use crate::isolation::{ScopeStore, Widen, page_pattern, page_stem};
use crate::utils::mime;

pub struct IsolationExpander {
    scope: Arc<ScopeStore>,
    destination: PathBuf,
}

impl IsolationExpander {
    pub fn new(scope: Arc<ScopeStore>, destination: PathBuf) -> Self {
        Self { scope, destination }
    }

    /// Reply for a decoded request path that has no file in the
    /// destination tree.
    pub fn on_miss(&self, path: &str) -> Reply {
        if !self.scope.exists() {
            return response::not_found(&self.destination);
        }

        let pattern = page_pattern(path);
        match self.scope.widen(&pattern) {
            Ok(Widen::Added) => {
                crate::log!("isolate"; "rendering {} ({})", path, pattern);
                self.holding(path)
            }
            Ok(Widen::AlreadyIncluded) => {
                crate::debug!("isolate"; "{} already includes {}, not retrying", path, pattern);
                response::not_found(&self.destination)
            }
            Ok(Widen::NoScope) => response::not_found(&self.destination),
            Err(e) => {
                crate::log!("isolate"; "failed to widen scope: {:#}", anyhow::Error::from(e));
                response::not_found(&self.destination)
            }
        }
    }

    fn holding(&self, path: &str) -> Reply {
        let body = HOLDING_HTML.render(&HoldingVars {
            path: path.to_string(),
            stem: page_stem(path).to_string(),
        });
        Reply::new(200, mime::types::HTML, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isolation::IsolationScope;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<ScopeStore>, IsolationExpander) {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("_site");
        fs::create_dir_all(&destination).unwrap();
        let store = Arc::new(ScopeStore::new(dir.path().join(".isolation.toml")));
        let expander = IsolationExpander::new(Arc::clone(&store), destination);
        (dir, store, expander)
    }

    #[test]
    fn test_no_scope_is_plain_404() {
        let (_dir, store, expander) = setup();
        let reply = expander.on_miss("/missing.html");

        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, b"Not found");
        assert!(!store.exists());
    }

    #[test]
    fn test_no_scope_uses_site_404() {
        let (dir, _store, expander) = setup();
        fs::write(dir.path().join("_site/404.html"), "<p>lost</p>").unwrap();

        let reply = expander.on_miss("/missing.html");
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, b"<p>lost</p>");
    }

    #[test]
    fn test_widen_then_loop_guard() {
        let (_dir, store, expander) = setup();
        store.save(&IsolationScope::default()).unwrap();

        let first = expander.on_miss("/foo/bar");
        assert_eq!(first.status, 200);
        let body = String::from_utf8(first.body).unwrap();
        assert!(body.contains("Rendering /foo/bar"));
        assert!(body.contains(r#"HAWKINS_LIVERELOAD_PENDING = "bar";"#));
        assert_eq!(store.load().unwrap().include, vec!["bar.*"]);

        let second = expander.on_miss("/foo/bar");
        assert_eq!(second.status, 404);
        assert_eq!(store.load().unwrap().include, vec!["bar.*"]);
    }

    #[test]
    fn test_same_page_other_extension_is_guarded() {
        let (_dir, store, expander) = setup();
        store
            .save(&IsolationScope {
                exclude: vec!["_posts/hello.md".into()],
                include: vec!["hello.*".into()],
            })
            .unwrap();

        assert_eq!(expander.on_miss("/2024/01/hello.html").status, 404);
    }

    #[test]
    fn test_site_root_maps_to_index() {
        let (_dir, store, expander) = setup();
        store.save(&IsolationScope::default()).unwrap();

        assert_eq!(expander.on_miss("/").status, 200);
        assert_eq!(store.load().unwrap().include, vec!["index.*"]);
    }

    #[test]
    fn test_seeded_root_is_guarded() {
        let (_dir, store, expander) = setup();
        store
            .save(&IsolationScope {
                exclude: vec![],
                include: vec!["index.*".into()],
            })
            .unwrap();

        assert_eq!(expander.on_miss("/").status, 404);
        assert_eq!(store.load().unwrap().include, vec!["index.*"]);
    }

    #[test]
    fn test_metacharacters_widen_literally() {
        let (_dir, store, expander) = setup();
        store.save(&IsolationScope::default()).unwrap();

        assert_eq!(expander.on_miss("/a[b").status, 200);
        assert_eq!(store.load().unwrap().include, vec!["a[[]b.*"]);
        assert_eq!(expander.on_miss("/a[b").status, 404);
    }

    #[test]
    fn test_corrupt_scope_is_plain_404() {
        let (dir, _store, expander) = setup();
        fs::write(dir.path().join(".isolation.toml"), "include = [").unwrap();

        assert_eq!(expander.on_miss("/foo/bar").status, 404);
    }
}
