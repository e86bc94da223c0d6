//! `hawkins isolate`: serve a handful of pages, render the rest on request.

use crate::{
    config::SiteConfig,
    core::register_scope,
    isolation::{ScopeStore, seed},
    log,
};
use anyhow::Result;
use std::sync::Arc;

/// Removes the scope file when the session ends, however it ends.
struct ScopeGuard(Arc<ScopeStore>);

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        match self.0.remove() {
            Ok(true) => crate::debug!("scope"; "removed {}", self.0.path().display()),
            Ok(false) => {}
            Err(e) => log!("scope"; "failed to remove {}: {}", self.0.path().display(), e),
        }
    }
}

/// Seed the scope file for `globs`, then run a serve session restricted to it.
pub fn isolate_site(config: &SiteConfig, globs: &[String]) -> Result<()> {
    let store = Arc::new(ScopeStore::new(config.scope_path()));
    let guard = write_scope(config, globs, &store)?;
    register_scope(Arc::clone(&store));

    let result = super::serve::serve_site(Arc::clone(&store));
    drop(guard);
    result
}

fn write_scope(config: &SiteConfig, globs: &[String], store: &Arc<ScopeStore>) -> Result<ScopeGuard> {
    let scope = seed::seed(config, globs)?;
    store.save(&scope)?;
    log!(
        "isolate";
        "{} pages excluded, including {}",
        scope.exclude.len(),
        scope.include.join(", ")
    );
    Ok(ScopeGuard(Arc::clone(store)))
}
