//! WebSocket server for live reload.
//!
//! An acceptor thread performs the handshake and registers each client.
//! Broadcasts go to every registered client; a client whose send fails is
//! dropped.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::ReloadMessage;

/// Maximum port retry attempts
pub const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the non-blocking acceptor.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// A slow client must not stall broadcasts to everyone else.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// A peer that never completes the upgrade must not stall the acceptor.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the reload websocket server. Cheap to clone.
#[derive(Clone)]
pub struct ReloadHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    port: u16,
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
    stopped: AtomicBool,
    acceptor: Mutex<Option<JoinHandle<()>>>,
}

impl ReloadHub {
    /// Bind `interface:base_port`, trying the following ports when taken,
    /// and start accepting clients.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        listener.set_nonblocking(true)?;

        let hub = Self {
            inner: Arc::new(HubInner {
                port,
                clients: Mutex::new(Vec::new()),
                stopped: AtomicBool::new(false),
                acceptor: Mutex::new(None),
            }),
        };

        let inner = Arc::clone(&hub.inner);
        let handle = thread::Builder::new()
            .name("reload-accept".into())
            .spawn(move || inner.accept_loop(listener))
            .context("failed to spawn reload acceptor")?;
        *hub.inner.acceptor.lock() = Some(handle);

        if port != base_port && base_port != 0 {
            crate::log!("reload"; "port {} in use, using {} instead", base_port, port);
        }
        crate::debug!("reload"; "ws://{}", SocketAddr::new(interface, port));
        Ok(hub)
    }

    /// Port the server actually bound.
    pub fn port(&self) -> u16 {
        self.inner.port
    }

    pub fn client_count(&self) -> usize {
        self.inner.clients.lock().len()
    }

    /// Tell every client that bundle `version` was published.
    pub fn notify_publish(&self, version: u64) {
        self.broadcast(&ReloadMessage::reload(version));
    }

    pub fn broadcast(&self, msg: &ReloadMessage) {
        let text = msg.to_json();
        let mut clients = self.inner.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(Message::Text(text.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("reload"; "broadcast to {} clients", clients.len());
    }

    /// Stop accepting and close every client. Idempotent.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.inner.acceptor.lock().take() {
            let _ = handle.join();
        }
        for mut ws in self.inner.clients.lock().drain(..) {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
    }
}

impl HubInner {
    fn accept_loop(&self, listener: TcpListener) {
        while !self.stopped.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);
                    self.add_client(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }
    }

    fn add_client(&self, stream: TcpStream) {
        // Handshake runs in blocking mode
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
        let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));

        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let connected = ReloadMessage::Connected.to_json();
                if let Err(e) = ws.send(Message::Text(connected.into())) {
                    crate::log!("reload"; "failed to send connected message: {}", e);
                    return;
                }
                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("reload"; "client registered (total: {})", clients.len());
            }
            Err(e) => {
                crate::log!("reload"; "handshake failed: {}", e);
            }
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
