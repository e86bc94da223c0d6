//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `hawkins.toml` during a serve session.

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content the current config was loaded from.
static CONFIG_HASH: Mutex<Option<blake3::Hash>> = Mutex::new(None);

#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

fn file_hash(config: &SiteConfig) -> Option<blake3::Hash> {
    std::fs::read(&config.config_path)
        .ok()
        .map(|content| blake3::hash(&content))
}

/// Reload config from disk if content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
pub fn reload_config() -> Result<bool> {
    let c = cfg();
    let cli = c.cli.context("config was not initialized from the command line")?;

    let new_hash = file_hash(&c);
    let mut current = CONFIG_HASH.lock();
    if new_hash == *current {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    *current = new_hash;

    Ok(true)
}

#[inline]
pub fn init_config(config: SiteConfig) -> Arc<SiteConfig> {
    *CONFIG_HASH.lock() = file_hash(&config);

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
