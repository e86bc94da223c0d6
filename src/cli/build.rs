//! One-shot site build.

use crate::{
    actor::build::BuildRunner,
    config::{BuildConfig, SiteConfig},
    generator::{CommandGenerator, Generator},
    log,
};
use anyhow::{Result, bail};

/// Run the generator once over the whole site.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    run_once(config, CommandGenerator::new())
}

fn run_once<G: Generator>(config: &SiteConfig, generator: G) -> Result<()> {
    let build_config = BuildConfig::resolve(config, None)?;
    log!(
        "build";
        "{} -> {}",
        config.source_dir().display(),
        config.destination_dir().display()
    );

    let result = BuildRunner::new(generator).trigger(&build_config);
    if result.failed {
        bail!("build failed after {:.2}s", result.elapsed.as_secs_f64());
    }
    log!("build"; "done in {:.2}s", result.elapsed.as_secs_f64());
    Ok(())
}
