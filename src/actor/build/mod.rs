//! Build Actor - the serialized rebuild lane
//!
//! Receives change sets from the FsActor, runs at most one generator (or
//! static copy) cycle at a time on a blocking thread, and hands changed
//! pages to the HubActor. Change sets arriving mid-cycle are merged into
//! the next one.

mod coalesce;
mod runner;

#[cfg(test)]
mod tests;

pub use runner::{BuildResult, BuildRunner, Plan, plan};

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::{BuildMsg, ChangeSet, HubMsg};
use crate::config::BuildConfig;
use crate::generator::Generator;
use crate::isolation::ScopeStore;
use coalesce::Coalescer;

type BuildTask<G> = JoinHandle<(BuildRunner<G>, BuildResult)>;

pub struct BuildActor<G: Generator> {
    rx: mpsc::Receiver<BuildMsg>,
    hub_tx: mpsc::Sender<HubMsg>,
    /// `None` while a cycle owns it
    runner: Option<BuildRunner<G>>,
    config: ArcSwap<BuildConfig>,
    scope: Arc<ScopeStore>,
    lane: Coalescer,
}

impl<G: Generator> BuildActor<G> {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        hub_tx: mpsc::Sender<HubMsg>,
        runner: BuildRunner<G>,
        config: Arc<BuildConfig>,
        scope: Arc<ScopeStore>,
    ) -> Self {
        Self {
            rx,
            hub_tx,
            runner: Some(runner),
            config: ArcSwap::new(config),
            scope,
            lane: Coalescer::new(),
        }
    }

    pub async fn run(mut self) {
        let mut task: Option<BuildTask<G>> = None;

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(BuildMsg::Changes(changes)) => {
                        if let Some(changes) = self.lane.submit(changes) {
                            task = self.launch(changes);
                        }
                    }
                    Some(BuildMsg::Shutdown) | None => break,
                },

                done = wait_task(&mut task) => {
                    if !self.on_cycle_done(done).await {
                        break;
                    }
                    task = self.lane.finish().and_then(|next| self.launch(next));
                }
            }
        }

        self.lane.stop();
        // An in-flight generator run finishes; its output is not announced.
        if let Some(handle) = task {
            let _ = handle.await;
        }
        crate::debug!("build"; "stopped");
    }

    /// Start a cycle for `changes`, skipping change sets that need no work.
    fn launch(&mut self, mut changes: ChangeSet) -> Option<BuildTask<G>> {
        loop {
            if changes.config || changes.scope {
                self.refresh_config(changes.config);
            }
            let config = self.config.load_full();
            match plan(&changes, &config.content) {
                Plan::Nothing => changes = self.lane.finish()?,
                work => {
                    let mut runner = self.runner.take()?;
                    return Some(tokio::task::spawn_blocking(move || {
                        let result = runner.dispatch(&config, work);
                        (runner, result)
                    }));
                }
            }
        }
    }

    /// Derive a fresh BuildConfig from the host config and scope file. A
    /// broken config keeps the previous one in place.
    fn refresh_config(&self, host_changed: bool) {
        if host_changed && let Err(e) = crate::config::reload_config() {
            crate::log!("error"; "config reload failed, keeping previous: {:#}", e);
            return;
        }
        let scope = self.scope.load();
        match BuildConfig::resolve(&crate::config::cfg(), scope.as_ref()) {
            Ok(config) => {
                crate::debug!(
                    "build";
                    "config refreshed ({} include, {} exclude)",
                    config.include.len(),
                    config.exclude.len()
                );
                self.config.store(Arc::new(config));
            }
            Err(e) => crate::log!("error"; "invalid build config, keeping previous: {:#}", e),
        }
    }

    /// Returns `false` when the session must stop.
    async fn on_cycle_done(&mut self, done: Option<(BuildRunner<G>, BuildResult)>) -> bool {
        let Some((runner, result)) = done else {
            crate::log!("error"; "build task panicked");
            crate::core::fail_session();
            return false;
        };
        self.runner = Some(runner);

        if result.failed {
            crate::core::fail_session();
            return false;
        }
        if !result.changed_pages.is_empty() {
            let pages = result.changed_pages;
            // Hub gone means no browsers to tell; builds carry on.
            let _ = self.hub_tx.send(HubMsg::Reload { pages }).await;
        }
        true
    }
}

/// Wait for the running cycle (pending forever if none). `None` if the task
/// panicked.
async fn wait_task<G: Generator>(
    task: &mut Option<BuildTask<G>>,
) -> Option<(BuildRunner<G>, BuildResult)> {
    match task.as_mut() {
        Some(handle) => {
            let result = handle.await.ok();
            *task = None;
            result
        }
        None => std::future::pending().await,
    }
}
