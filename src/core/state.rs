//! Shutdown state for serve mode.
//!
//! `SHUTDOWN` is raised by Ctrl+C or by a fatal watcher error. Once raised,
//! the registered HTTP server is unblocked so its request loop ends and the
//! serve command can tear everything down in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received or fatal error)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: exits immediately, nothing to tear down
/// - After `register_server()`: graceful shutdown (unblock server)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SERVER.get().is_none() {
            std::process::exit(130);
        }
        crate::log!("serve"; "shutting down...");
        request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop.
/// A shutdown requested earlier unblocks it right away.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
    if SHUTDOWN.load(Ordering::SeqCst)
        && let Some(server) = SERVER.get()
    {
        server.unblock();
    }
}

/// Raise the shutdown flag and unblock the registered server, if any.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
