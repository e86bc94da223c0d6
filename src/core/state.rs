//! Session state for serve mode.
//!
//! Three orthogonal flags:
//! - `SERVING`: initial build complete, requests are served and watcher
//!   events are processed
//! - `FAILED`: a build, copy or remove failed and the session is being torn
//!   down (the process exits non-zero)
//! - `SHUTDOWN`: shutdown has been requested (Ctrl+C or failure)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

use crate::isolation::ScopeStore;

/// Site is ready to serve requests (initial build complete)
/// - `false`: Show loading page
/// - `true`: Serve normally
static SERVING: AtomicBool = AtomicBool::new(false);

/// Session failed (fail-loud teardown in progress)
static FAILED: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Scope file to delete when the process exits before serving starts
static SCOPE: OnceLock<Arc<ScopeStore>> = OnceLock::new();

// =============================================================================
// SERVING state
// =============================================================================

/// Check if the site is ready to serve requests
pub fn is_serving() -> bool {
    SERVING.load(Ordering::SeqCst)
}

/// Mark the site as ready to serve (call after initial build completes)
pub fn set_serving() {
    SERVING.store(true, Ordering::SeqCst);
}

// =============================================================================
// FAILED state
// =============================================================================

pub fn is_failed() -> bool {
    FAILED.load(Ordering::SeqCst)
}

/// Record a fatal build failure and tear the session down.
pub fn fail_session() {
    FAILED.store(true, Ordering::SeqCst);
    request_shutdown();
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: remove the scope file and exit
/// - After `register_server()`: graceful shutdown (unblock server, notify actors)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SERVER.get().is_some() {
            crate::log!("serve"; "shutting down...");
            request_shutdown();
        } else {
            // Still building: nothing to drain, but a seeded scope must not
            // outlive the process
            remove_registered_scope();
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Stop the HTTP loop and notify actors. Idempotent.
pub fn request_shutdown() {
    if SHUTDOWN.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.send(());
    }
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the scope file removed on an early Ctrl+C.
pub fn register_scope(store: Arc<ScopeStore>) {
    let _ = SCOPE.set(store);
}

fn remove_registered_scope() {
    if let Some(store) = SCOPE.get()
        && let Err(e) = store.remove()
    {
        crate::log!("scope"; "failed to remove {}: {}", store.path().display(), e);
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================
