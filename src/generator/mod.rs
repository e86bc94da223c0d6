//! Site generator seam.
//!
//! Rendering is delegated to an external tool. The build lane only needs two
//! things from it: run one pass over the site, and tell whether a given
//! output page changed during that pass.
//!
//! - [`CommandGenerator`]: runs the configured command line
//! - [`OutputSnapshot`]: content hashes of the destination tree

mod command;
mod snapshot;

pub use command::CommandGenerator;
pub use snapshot::{OutputSnapshot, output_pages};

use crate::config::BuildConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from a generator pass.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The generator command failed to start or exited non-zero.
    #[error(transparent)]
    Command(#[from] anyhow::Error),

    #[error("failed to access `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to write config overlay")]
    Overlay(#[from] serde_json::Error),
}

/// An external site generator.
pub trait Generator: Send + 'static {
    /// Render the site described by `config` into its destination.
    fn process(&mut self, config: &BuildConfig) -> Result<(), BuildError>;

    /// Whether `page` (an output path such as `/a/index.html`) has different
    /// content than before the last [`process`](Generator::process) call.
    fn regenerate(&self, page: &str) -> bool;
}
