//! Hawkins - a live-reload development server for static site generators.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod generator;
mod isolation;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{SiteConfig, init_config};
use isolation::ScopeStore;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SiteConfig::load(cli)?);

    match &cli.command {
        Commands::Build { .. } => cli::build::build_site(&config)?,
        Commands::Serve { .. } => {
            let scope = Arc::new(ScopeStore::new(config.scope_path()));
            if scope.exists() {
                log!("isolate"; "{} exists, serving in isolation", scope.path().display());
            }
            cli::serve::serve_site(scope)?;
        }
        Commands::Isolate { files, .. } => cli::isolate::isolate_site(&config, files)?,
    }

    if core::is_failed() {
        std::process::exit(1);
    }
    Ok(())
}
