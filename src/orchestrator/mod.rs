//! Rebuild Orchestrator
//!
//! Owns the published artifact and keeps it in step with the workspace.
//!
//! ```text
//! Monitor ──Changeset──> rebuild-worker ──build + bundle──> PublishedSlot ──> on_publish
//!                              (coalesces queued changesets)        ▲
//!                                                 current_artifact()┘ (never blocks)
//! ```
//!
//! Startup order matters: the watcher subscribes before the initial build, so
//! edits made while it runs are replayed afterwards instead of lost.

mod slot;
mod worker;


use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use tokio::runtime::Runtime;

use crate::bundle::{Artifact, Bundler};
use crate::error::{Error, Result};
use crate::graph::{self, ScanCache};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::monitor::{ChangeFilter, Changeset, Monitor, MonitorOptions};
use crate::workspace::{DEFAULT_EXTENSIONS, Workspace};

pub use slot::PublishedSlot;
use worker::Job;

type PublishCallback = Box<dyn Fn(&Artifact) + Send + Sync>;

/// Everything needed to start a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    pub entry: String,
    pub extensions: Vec<String>,
    pub filter: ChangeFilter,
    pub monitor: MonitorOptions,
    /// Also write each published bundle here
    pub output: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(root: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            entry: entry.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            filter: ChangeFilter::accept_all(),
            monitor: MonitorOptions::default(),
            output: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: MonitorOptions) -> Self {
        self.monitor = monitor;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }
}

/// Result of one successful rebuild.
#[derive(Debug, Clone)]
pub enum Rebuild {
    /// New content is now being served
    Published(Arc<Artifact>),
    /// Output matched the served artifact; nothing was replaced
    Unchanged(Arc<Artifact>),
}

impl Rebuild {
    pub fn artifact(&self) -> &Arc<Artifact> {
        match self {
            Self::Published(a) | Self::Unchanged(a) => a,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

/// Build state shared between the orchestrator handle and the worker thread.
pub(crate) struct Pipeline {
    workspace: Workspace,
    entry: String,
    slot: PublishedSlot,
    /// Held for the whole build-and-publish section
    build_lock: Mutex<()>,
    cache: ScanCache,
    listeners: RwLock<Vec<PublishCallback>>,
    stopped: AtomicBool,
    builds: AtomicU64,
    output: Option<PathBuf>,
}

impl Pipeline {
    fn new(workspace: Workspace, entry: String, output: Option<PathBuf>) -> Self {
        Self {
            workspace,
            entry,
            slot: PublishedSlot::new(Artifact::placeholder("build pending")),
            build_lock: Mutex::new(()),
            cache: ScanCache::new(),
            listeners: RwLock::new(Vec::new()),
            stopped: AtomicBool::new(false),
            builds: AtomicU64::new(0),
            output,
        }
    }

    /// Build the graph, bundle it and publish if the output changed.
    ///
    /// On error nothing is published and the previous artifact stays.
    fn rebuild(&self) -> Result<Rebuild> {
        let _guard = self.build_lock.lock();
        self.builds.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let graph = graph::build_with_cache(&self.workspace, &self.entry, &self.cache)?;
        let current = self.slot.load();
        let artifact =
            Bundler::bundle_artifact(&graph, current.version() + 1)?.with_duration(started.elapsed());

        let live: FxHashSet<_> = graph.ordered().map(|m| m.fingerprint).collect();
        self.cache.retain(&live);

        if artifact.same_content(&current) {
            return Ok(Rebuild::Unchanged(current));
        }

        let published = self.slot.publish(artifact);
        self.persist(&published);
        for listener in self.listeners.read().iter() {
            listener(&published);
        }
        Ok(Rebuild::Published(published))
    }

    /// First build at startup.
    ///
    /// An unresolvable entry is fatal. Any other failure is served as a
    /// placeholder script until a later rebuild succeeds.
    fn initial_build(&self) -> Result<()> {
        let result = self.rebuild();
        report(&result);

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_entry_resolution() => Err(e),
            Err(e) => {
                self.slot.publish(Artifact::placeholder(&e.to_string()));
                Ok(())
            }
        }
    }

    /// Change-driven rebuild; failures are logged, never propagated.
    fn rebuild_for(&self, changes: &Changeset) {
        crate::debug!("watch"; "rebuilding for {} changed path(s)", changes.len());
        report(&self.rebuild());
    }

    fn persist(&self, artifact: &Artifact) {
        let Some(output) = &self.output else {
            return;
        };

        let written = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(output, artifact.text()));

        if let Err(e) = written {
            crate::log!("error"; "failed to write {}: {}", output.display(), e);
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Rebuild outcome on the watch status line.
fn report(result: &Result<Rebuild>) {
    match result {
        Ok(Rebuild::Published(artifact)) => {
            let count = artifact.module_count();
            status_success(&format!(
                "bundled {} module{} in {}ms (v{})",
                count,
                if count == 1 { "" } else { "s" },
                artifact.duration().as_millis(),
                artifact.version()
            ));
        }
        Ok(Rebuild::Unchanged(_)) => status_unchanged("unchanged"),
        Err(e) => status_error("build failed", &error_detail(e)),
    }
}

fn error_detail(error: &Error) -> String {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    detail
}

/// Live bundling pipeline for one workspace.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    monitor: Mutex<Option<Monitor>>,
    jobs: Sender<Job>,
    worker: Mutex<Option<JoinHandle<()>>>,
    fatal: Receiver<Error>,
    runtime: Mutex<Option<Runtime>>,
}

impl Orchestrator {
    /// Start watching `root` and publish the first build of `entry`.
    pub fn initialize(root: impl AsRef<Path>, entry: &str, filter: ChangeFilter) -> Result<Self> {
        Self::initialize_with(PipelineOptions::new(root.as_ref(), entry).with_filter(filter))
    }

    pub fn initialize_with(options: PipelineOptions) -> Result<Self> {
        let workspace = Workspace::with_extensions(&options.root, options.extensions)?;

        let mut monitor = Monitor::watch(workspace.root_path(), options.filter, options.monitor)?;

        let pipeline = Arc::new(Pipeline::new(workspace, options.entry, options.output));
        pipeline.initial_build()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("swarm-monitor")
            .enable_all()
            .build()
            .map_err(|source| Error::Spawn {
                what: "monitor runtime",
                source,
            })?;

        let (jobs, job_rx) = channel::unbounded();
        let worker = worker::spawn(Arc::clone(&pipeline), job_rx)?;

        let (fatal_tx, fatal) = channel::unbounded();
        let queue = jobs.clone();
        monitor.start(
            runtime.handle(),
            move |changes| {
                let _ = queue.send(Job::Rebuild(changes));
            },
            move |error| {
                let _ = fatal_tx.send(error);
            },
        );

        Ok(Self {
            pipeline,
            monitor: Mutex::new(Some(monitor)),
            jobs,
            worker: Mutex::new(Some(worker)),
            fatal,
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// The artifact being served right now.
    #[inline]
    pub fn current_artifact(&self) -> Arc<Artifact> {
        self.pipeline.slot.load()
    }

    #[inline]
    pub fn current_text(&self) -> Arc<str> {
        self.current_artifact().shared_text()
    }

    /// Run `callback` after every successful publish (on the building thread).
    pub fn on_publish(&self, callback: impl Fn(&Artifact) + Send + Sync + 'static) {
        self.pipeline.listeners.write().push(Box::new(callback));
    }

    /// Errors that stopped the monitor; the pipeline no longer tracks changes
    /// once one arrives.
    pub fn fatal_errors(&self) -> Receiver<Error> {
        self.fatal.clone()
    }

    /// Rebuild immediately on the calling thread, serialized with the worker.
    pub fn rebuild_now(&self) -> Result<Rebuild> {
        self.pipeline.rebuild()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.pipeline.workspace
    }

    pub fn entry(&self) -> &str {
        &self.pipeline.entry
    }

    /// Builds attempted so far, including failed and unchanged ones.
    pub fn build_count(&self) -> u64 {
        self.pipeline.builds.load(Ordering::Relaxed)
    }

    /// Stop watching and wind down the worker.
    ///
    /// A rebuild already running completes and publishes; queued ones are
    /// dropped. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.pipeline.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(mut monitor) = self.monitor.lock().take() {
            monitor.stop();
        }

        let _ = self.jobs.send(Job::Shutdown);
        if let Some(handle) = self.worker.lock().take()
            && handle.thread().id() != thread::current().id()
        {
            let _ = handle.join();
        }

        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
        crate::debug!("watch"; "pipeline stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.pipeline.is_stopped()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
