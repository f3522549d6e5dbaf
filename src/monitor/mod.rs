//! Change Monitor
//!
//! Watches the workspace and turns bursts of filesystem events into one
//! [`Changeset`] per quiet period. Follows the "Watcher-First" pattern: the
//! watcher is subscribed in [`Monitor::watch`] and events buffer in a bounded
//! channel until [`Monitor::start`] spawns the loop.
//!
//! ```text
//! notify ──try_send──> bounded channel ──> loop (Idle ⇄ Collecting) ──> on_change
//!                                             └─ overflow ──> on_fatal(Backpressure)
//! ```

mod changeset;
mod debouncer;
mod filter;
mod kind;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

pub use changeset::Changeset;
pub use filter::ChangeFilter;
pub use kind::{EventKind, classify};

use crate::error::{Error, Result};
use debouncer::{DEFAULT_DEBOUNCE, DEFAULT_LIVENESS, Debouncer};
use filter::{in_hidden_dir, is_temp_file};

/// Default size of the watcher-to-loop event buffer.
pub const DEFAULT_CAPACITY: usize = 2048;

type RawEvent = notify::Result<notify::Event>;

/// Timing and buffering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub debounce: Duration,
    pub liveness: Duration,
    pub capacity: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            liveness: DEFAULT_LIVENESS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Producer side of the event buffer. Never blocks.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<RawEvent>,
    overflow: Arc<AtomicBool>,
}

impl EventSink {
    pub(crate) fn deliver(&self, event: RawEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(event) {
            self.overflow.store(true, Ordering::Release);
        }
    }
}

/// Debounced filesystem watcher for one root.
pub struct Monitor {
    root: PathBuf,
    filter: ChangeFilter,
    options: MonitorOptions,
    watcher: Option<RecommendedWatcher>,
    events: Option<mpsc::Receiver<RawEvent>>,
    overflow: Arc<AtomicBool>,
    /// Set once stopped; held while a callback runs
    stopped: Arc<Mutex<bool>>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl Monitor {
    /// Subscribe to `root` recursively. Events buffer until [`start`](Self::start).
    pub fn watch(root: &Path, filter: ChangeFilter, options: MonitorOptions) -> Result<Self> {
        let (mut monitor, sink) = Self::detached(root, filter, options);

        let setup_error = |source| Error::WatchSetup {
            root: root.to_path_buf(),
            source,
        };
        let mut watcher = notify::recommended_watcher(move |res| sink.deliver(res)).map_err(setup_error)?;
        watcher.watch(root, RecursiveMode::Recursive).map_err(setup_error)?;

        crate::debug!("watch"; "watching {}", root.display());
        monitor.watcher = Some(watcher);
        Ok(monitor)
    }

    /// A monitor fed only through the returned sink.
    pub(crate) fn detached(root: &Path, filter: ChangeFilter, options: MonitorOptions) -> (Self, EventSink) {
        let (tx, rx) = mpsc::channel(options.capacity.max(1));
        let overflow = Arc::new(AtomicBool::new(false));
        let sink = EventSink {
            tx,
            overflow: Arc::clone(&overflow),
        };

        let monitor = Self {
            root: root.to_path_buf(),
            filter,
            options,
            watcher: None,
            events: Some(rx),
            overflow,
            stopped: Arc::new(Mutex::new(false)),
            stop_tx: None,
        };
        (monitor, sink)
    }

    /// Spawn the debounce loop on `runtime`.
    ///
    /// `on_change` runs on the loop and must not block on a build, nor call
    /// [`stop`](Self::stop). `on_fatal` receives the error that ended the loop.
    /// Calling `start` twice, or after `stop`, does nothing.
    pub fn start<C, F>(&mut self, runtime: &Handle, on_change: C, on_fatal: F)
    where
        C: FnMut(Changeset) + Send + 'static,
        F: FnOnce(Error) + Send + 'static,
    {
        let Some(events) = self.events.take() else {
            return;
        };
        if *self.stopped.lock() {
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        self.stop_tx = Some(stop_tx);

        let event_loop = EventLoop {
            root: self.root.clone(),
            events,
            stop: stop_rx,
            overflow: Arc::clone(&self.overflow),
            capacity: self.options.capacity,
            filter: self.filter.clone(),
            debouncer: Debouncer::new(self.options.debounce, self.options.liveness, Instant::now()),
            stopped: Arc::clone(&self.stopped),
        };

        runtime.spawn(async move {
            if let Err(e) = event_loop.run(on_change).await {
                crate::log!("watch"; "stopped: {}", e);
                on_fatal(e);
            }
        });
    }

    /// Stop watching. No callback fires after this returns.
    pub fn stop(&mut self) {
        *self.stopped.lock() = true;
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        // Dropping the watcher releases the OS subscription
        if self.watcher.take().is_some() {
            crate::debug!("watch"; "released {}", self.root.display());
        }
        self.events = None;
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

struct EventLoop {
    root: PathBuf,
    events: mpsc::Receiver<RawEvent>,
    stop: watch::Receiver<bool>,
    overflow: Arc<AtomicBool>,
    capacity: usize,
    filter: ChangeFilter,
    debouncer: Debouncer,
    stopped: Arc<Mutex<bool>>,
}

impl EventLoop {
    async fn run(mut self, mut on_change: impl FnMut(Changeset)) -> Result<()> {
        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                biased;
                _ = self.stop.changed() => return Ok(()),
                next = self.events.recv() => {
                    if self.overflow.load(Ordering::Acquire) {
                        return Err(Error::Backpressure { capacity: self.capacity });
                    }
                    match next {
                        Some(Ok(event)) => self.accept(&event),
                        Some(Err(e)) => crate::log!("watch"; "notify error: {}", e),
                        // Watcher released
                        None => return Ok(()),
                    }
                }
                _ = sleep_until(deadline) => {
                    if let Some(changes) = self.debouncer.on_timer(Instant::now())
                        && !self.flush(changes, &mut on_change)
                    {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Hand a finished window to the callback. Returns `false` once stopped.
    fn flush(&self, changes: Changeset, on_change: &mut impl FnMut(Changeset)) -> bool {
        let stopped = self.stopped.lock();
        if *stopped {
            return false;
        }
        for (path, kind) in changes.iter() {
            crate::debug!("watch"; "{}: {}", kind, path.display());
        }
        on_change(changes);
        true
    }

    fn accept(&mut self, event: &notify::Event) {
        let now = Instant::now();
        for (kind, path) in classify(event) {
            if !kind.is_relevant()
                || is_temp_file(&path)
                || in_hidden_dir(&self.root, &path)
                || !self.filter.accepts(kind, &path)
            {
                continue;
            }
            self.debouncer.record(kind, path, now);
        }
    }
}
