//! Actor Coordinator - wires up the serve session
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the watcher before the initial build
//! - Runs the initial build, then flips the session to serving
//! - Runs the actors until shutdown

mod runtime;
mod watch_paths;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::{BuildActor, BuildRunner};
use super::fs::FsActor;
use super::hub::HubActor;
use super::messages::{BuildMsg, HubMsg};
use crate::config::{BuildConfig, SiteConfig};
use crate::generator::Generator;
use crate::isolation::ScopeStore;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator<G: Generator> {
    config: Arc<SiteConfig>,
    build_config: Arc<BuildConfig>,
    scope: Arc<ScopeStore>,
    runner: BuildRunner<G>,
    shutdown_rx: Receiver<()>,
}

impl<G: Generator> Coordinator<G> {
    pub fn new(
        config: Arc<SiteConfig>,
        build_config: Arc<BuildConfig>,
        scope: Arc<ScopeStore>,
        runner: BuildRunner<G>,
        shutdown_rx: Receiver<()>,
    ) -> Self {
        Self {
            config,
            build_config,
            scope,
            runner,
            shutdown_rx,
        }
    }

    /// Run the session. Returns once shutdown was requested, or right after
    /// a failed initial build (the session is then marked failed).
    pub async fn run(self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let (hub_tx, hub_rx) = mpsc::channel::<HubMsg>(CHANNEL_BUFFER);
        let serve = &self.config.serve;

        // Edits made during the initial build are queued, not lost
        let fs_actor = if serve.watch {
            let paths = watch_paths::collect_watch_paths(&self.config);
            let actor = FsActor::new(paths, build_tx.clone())
                .map_err(|e| anyhow!("watcher failed: {}", e))?;
            Some(actor)
        } else {
            None
        };

        if serve.watch {
            match crate::reload::server::start_reload_server(
                serve.interface,
                serve.reload_port,
                hub_tx.clone(),
            ) {
                Ok(port) => crate::cli::serve::set_reload_port(port),
                Err(e) => crate::log!("reload"; "reload server failed: {:#}", e),
            }
        }

        let Some(runner) = initial_build(self.runner, Arc::clone(&self.build_config)).await else {
            crate::core::fail_session();
            return Ok(());
        };
        crate::core::set_serving();

        let build_actor = BuildActor::new(build_rx, hub_tx.clone(), runner, self.build_config, self.scope);
        let hub_actor = HubActor::new(hub_rx);

        crate::debug!("actor"; "start");
        runtime::run_actors(fs_actor, build_actor, hub_actor, build_tx, hub_tx, self.shutdown_rx)
            .await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}

/// Full generator pass before serving. `None` if it failed.
async fn initial_build<G: Generator>(
    mut runner: BuildRunner<G>,
    config: Arc<BuildConfig>,
) -> Option<BuildRunner<G>> {
    let task = tokio::task::spawn_blocking(move || {
        let result = runner.trigger(&config);
        (runner, result)
    });
    match task.await {
        Ok((runner, result)) if !result.failed => Some(runner),
        Ok(_) => None,
        Err(e) => {
            crate::log!("error"; "initial build panicked: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_site_config;
    use crate::generator::BuildError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingGenerator(Arc<AtomicUsize>);

    impl Generator for CountingGenerator {
        fn process(&mut self, _config: &BuildConfig) -> Result<(), BuildError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn regenerate(&self, _page: &str) -> bool {
            false
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_initial_build_then_shutdown() {
        let dir = TempDir::new().unwrap();
        let mut site = test_site_config(dir.path());
        site.serve.watch = false;
        std::fs::create_dir_all(&site.build.destination).unwrap();

        let build_config = Arc::new(BuildConfig::resolve(&site, None).unwrap());
        let scope = Arc::new(ScopeStore::new(site.scope_path()));
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = BuildRunner::new(CountingGenerator(Arc::clone(&calls)));

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
        shutdown_tx.send(()).unwrap();

        let coordinator = Coordinator::new(Arc::new(site), build_config, scope, runner, shutdown_rx);
        tokio::time::timeout(std::time::Duration::from_secs(10), coordinator.run())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(crate::core::is_serving());
    }
}
