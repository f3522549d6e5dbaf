//! Development server with live reload support.
//!
//! Serves the current bundle at its configured URL, the reload client at
//! `/__swarm/reload.js`, and everything else as static files from the
//! workspace root.

mod content;
mod lifecycle;
mod path;
mod response;


use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Method, Request, Server};

use crate::config::SwarmConfig;
use crate::embed::serve::RELOAD_JS_URL;
use crate::orchestrator::Orchestrator;
use crate::reload::ReloadHub;
use crate::{debug, log};

/// Request handler threads.
const REQUEST_THREADS: usize = 4;

/// What a request handler needs to answer.
pub struct ServeContext {
    orchestrator: Arc<Orchestrator>,
    root: PathBuf,
    bundle_url: String,
    ws_port: Option<u16>,
}

impl ServeContext {
    pub fn new(orchestrator: Arc<Orchestrator>, bundle_url: impl Into<String>) -> Self {
        let root = orchestrator.workspace().root_path().to_path_buf();
        Self {
            orchestrator,
            root,
            bundle_url: bundle_url.into(),
            ws_port: None,
        }
    }

    /// Enable reload script injection, pointing clients at `ws_port`.
    pub fn with_reload(mut self, ws_port: u16) -> Self {
        self.ws_port = Some(ws_port);
        self
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    ctx: Arc<ServeContext>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(ctx: ServeContext, interface: IpAddr, port: u16) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(interface, port)?;
    Ok(BoundServer {
        server: Arc::new(server),
        addr,
        ctx: Arc::new(ctx),
    })
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared handle, used to unblock the request loop.
    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Run the request loop until the server is unblocked.
    pub fn run(self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        for request in self.server.incoming_requests() {
            let ctx = Arc::clone(&self.ctx);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

/// Run `swarm serve` until Ctrl+C or a fatal pipeline error.
pub fn serve(config: &SwarmConfig) -> Result<()> {
    let orchestrator = Arc::new(
        Orchestrator::initialize_with(config.pipeline_options())
            .context("failed to start the bundling pipeline")?,
    );

    let bundle_url = config.bundle_url();
    let mut ctx = ServeContext::new(Arc::clone(&orchestrator), bundle_url.clone());

    let hub = if config.serve.reload {
        let hub = ReloadHub::bind(config.serve.interface, config.serve.ws_port)?;
        let notify = hub.clone();
        orchestrator.on_publish(move |artifact| notify.notify_publish(artifact.version()));
        ctx = ctx.with_reload(hub.port());
        Some(hub)
    } else {
        None
    };

    let bound = bind_server(ctx, config.serve.interface, config.serve.port)?;
    crate::core::register_server(bound.server());
    let fatal =
        lifecycle::watch_fatal(orchestrator.fatal_errors(), crate::core::request_shutdown)?;

    log!("serve"; "http://{}", bound.addr());
    log!("serve"; "bundle at http://{}{}", bound.addr(), bundle_url);
    debug!("serve"; "root {}", orchestrator.workspace().root_path().display());

    let result = bound.run();

    orchestrator.shutdown();
    if let Some(hub) = hub {
        hub.stop();
    }
    result?;

    match fatal.lock().take() {
        Some(error) => Err(anyhow::Error::new(error).context("file watching failed")),
        None => Ok(()),
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let url = path::request_path(request.url()).to_string();
    debug!("serve"; "{} {}", request.method(), url);

    if url == ctx.bundle_url {
        let artifact = ctx.orchestrator.current_artifact();
        return response::respond_bundle(request, &artifact);
    }

    if url == RELOAD_JS_URL
        && let Some(port) = ctx.ws_port
    {
        return response::respond_reload_js(request, port);
    }

    match path::resolve_path(&url, &ctx.root) {
        Some(file) => response::respond_file(request, &file, ctx.ws_port.is_some()),
        None => response::respond_not_found(request),
    }
}
