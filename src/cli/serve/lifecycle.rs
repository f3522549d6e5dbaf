//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use tiny_http::Server;

use crate::error::Error;
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// First fatal pipeline error, if one arrived.
pub type FatalSlot = Arc<Mutex<Option<Error>>>;

/// Forward the first fatal pipeline error into a shutdown.
///
/// The error is logged and stored in the returned slot before `on_fatal`
/// runs. Call after the server is registered so `on_fatal` can unblock it.
pub fn watch_fatal(
    errors: Receiver<Error>,
    on_fatal: impl FnOnce() + Send + 'static,
) -> Result<FatalSlot> {
    let slot: FatalSlot = Arc::new(Mutex::new(None));
    let store = Arc::clone(&slot);

    thread::Builder::new()
        .name("fatal-watch".into())
        .spawn(move || {
            if let Ok(error) = errors.recv() {
                crate::logger::status_error("watching stopped", &error.to_string());
                *store.lock() = Some(error);
                on_fatal();
            }
        })
        .context("failed to spawn fatal error watcher")?;

    Ok(slot)
}
