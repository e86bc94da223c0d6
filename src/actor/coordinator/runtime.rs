use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::build::BuildActor;
use crate::actor::fs::FsActor;
use crate::actor::hub::HubActor;
use crate::actor::messages::{BuildMsg, HubMsg};
use crate::generator::Generator;

/// How long an in-flight generator run may take to wind down.
const BUILD_DRAIN: Duration = Duration::from_secs(5);
const HUB_DRAIN: Duration = Duration::from_millis(500);

/// Run all actors until the shutdown signal, then stop them in order:
/// watcher, build lane, hub.
pub(super) async fn run_actors<G: Generator>(
    fs: Option<FsActor>,
    build: BuildActor<G>,
    hub: HubActor,
    build_tx: mpsc::Sender<BuildMsg>,
    hub_tx: mpsc::Sender<HubMsg>,
    shutdown_rx: Receiver<()>,
) {
    let hub_handle = tokio::spawn(hub.run());
    let build_handle = tokio::spawn(build.run());
    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));

    loop {
        if shutdown_rx.try_recv().is_ok() {
            crate::debug!("actor"; "shutdown signal received");
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Dropping the watcher ends the event stream
    if let Some(handle) = fs_handle {
        handle.abort();
    }

    let _ = build_tx.send(BuildMsg::Shutdown).await;
    if tokio::time::timeout(BUILD_DRAIN, build_handle).await.is_err() {
        crate::log!("build"; "in-flight build still running, not waiting for it");
    }

    let _ = hub_tx.send(HubMsg::Shutdown).await;
    let _ = tokio::time::timeout(HUB_DRAIN, hub_handle).await;
}
