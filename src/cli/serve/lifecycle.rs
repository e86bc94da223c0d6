//! Server lifecycle management.

use crate::{
    actor::{Coordinator, build::BuildRunner},
    config::{BuildConfig, SiteConfig},
    generator::CommandGenerator,
    isolation::ScopeStore,
    log,
};
use anyhow::{Result, anyhow};
use crossbeam::channel::Receiver;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Upper bound on waiting for the actor thread after the HTTP loop ends.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(8);

/// Bind to the specified interface and port, trying the following ports
/// when it is taken.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let addr = SocketAddr::new(interface, base_port.saturating_add(offset));
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Spawn the actor system (initial build, watcher, build lane, hub) on its
/// own thread and runtime.
pub fn spawn_actors(
    config: Arc<SiteConfig>,
    build_config: Arc<BuildConfig>,
    scope: Arc<ScopeStore>,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_actor_system(config, build_config, scope, shutdown_rx) {
            log!("actor"; "error: {:#}", e);
            crate::core::fail_session();
        }
    })
}

fn run_actor_system(
    config: Arc<SiteConfig>,
    build_config: Arc<BuildConfig>,
    scope: Arc<ScopeStore>,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to create tokio runtime: {}", e))?;

    let runner = BuildRunner::new(CommandGenerator::new());
    rt.block_on(Coordinator::new(config, build_config, scope, runner, shutdown_rx).run())
}

/// Wait for the actor system to wind down, bounded by [`SHUTDOWN_WAIT`].
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    let step = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while waited < SHUTDOWN_WAIT {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(step);
        waited += step;
    }
    log!("serve"; "actors did not stop in time");
}
