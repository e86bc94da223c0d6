//! Command-line interface module.

mod args;
pub mod build;
pub mod isolate;
pub mod serve;

pub use args::{Cli, Commands};
