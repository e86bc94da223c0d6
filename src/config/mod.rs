//! Site configuration management for `hawkins.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [build] and [serve] definitions
//! ├── types/         # ConfigError, global config handle
//! ├── effective.rs   # BuildConfig handed to the generator
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! The file is optional: without one, defaults apply and the current
//! directory is the site root.

mod effective;
pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use effective::BuildConfig;
pub use section::{BuildSection, ServeSection};
pub use types::{ConfigError, cfg, init_config, reload_config};

use crate::{cli::Cli, isolation::SCOPE_FILE, log, utils::path::normalize_path};
use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing hawkins.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file, which may not exist
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site root directory, the parent of the config file
    #[serde(skip)]
    pub root: PathBuf,

    /// Generator settings
    #[serde(default)]
    pub build: BuildSection,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeSection,
}

impl SiteConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file. The site root is the
    /// config file's parent, or cwd when no file exists.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config, &cwd) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        config.config_path = normalize_path(&config_path);
        config.cli = Some(cli);
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Resolve root, apply command-line overrides and make paths absolute.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = normalize_path(&root);

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.destination, cli.destination.as_ref());
        self.build.source = normalize_path(&self.root.join(&self.build.source));
        self.build.destination = normalize_path(&self.root.join(&self.build.destination));

        let build_args = cli.build_args();
        crate::logger::set_verbose(build_args.verbose);
        Self::update_option(&mut self.build.drafts, build_args.drafts.as_ref());
        Self::update_option(&mut self.build.future, build_args.future.as_ref());

        if let Some(args) = cli.serve_args() {
            Self::update_option(&mut self.serve.interface, args.interface.as_ref());
            Self::update_option(&mut self.serve.port, args.port.as_ref());
            Self::update_option(&mut self.serve.reload_port, args.reload_port.as_ref());
            Self::update_option(&mut self.serve.watch, args.watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate configuration, reporting the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.build.command.first().is_none_or(|p| p.trim().is_empty()) {
            bail!(ConfigError::Validation("`build.command` must name a program".into()));
        }
        if self.build.source == self.build.destination {
            bail!(ConfigError::Validation(
                "`build.source` and `build.destination` must differ".into()
            ));
        }
        if self.serve.port == self.serve.reload_port {
            bail!(ConfigError::Validation(format!(
                "`serve.port` and `serve.reload_port` are both {}",
                self.serve.port
            )));
        }
        if self.serve.min_delay > self.serve.max_delay {
            bail!(ConfigError::Validation(
                "`serve.min_delay` is larger than `serve.max_delay`".into()
            ));
        }
        for (field, patterns) in [
            ("serve.ignore", &self.serve.ignore),
            ("serve.blocked_agents", &self.serve.blocked_agents),
        ] {
            for pattern in patterns {
                if let Err(err) = Regex::new(pattern) {
                    bail!(ConfigError::Validation(format!("`{field}`: {err}")));
                }
            }
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Site source directory (absolute after loading)
    pub fn source_dir(&self) -> &Path {
        &self.build.source
    }

    /// Generator output directory (absolute after loading)
    pub fn destination_dir(&self) -> &Path {
        &self.build.destination
    }

    /// Location of the isolation scope file.
    pub fn scope_path(&self) -> PathBuf {
        self.root.join(SCOPE_FILE)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config rooted at `root` with `_site` as destination, as `load` would produce.
#[cfg(test)]
pub fn test_site_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.root = root.to_path_buf();
    config.config_path = root.join("hawkins.toml");
    config.build.source = root.to_path_buf();
    config.build.destination = root.join("_site");
    config
}
