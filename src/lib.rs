//! swarm - a dependency-ordered module bundler with a live-reload dev server.
//!
//! The library side is the live bundling pipeline: resolve modules inside a
//! [`Workspace`], build a [`graph::ModuleGraph`] from an entry, serialize it
//! with the [`Bundler`], and keep the result fresh with an [`Orchestrator`]
//! driven by a debounced filesystem [`monitor::Monitor`].
//!
//! ```ignore
//! use swarm::{ChangeFilter, Orchestrator};
//!
//! let orch = Orchestrator::initialize("web", "app/src/ep/app", ChangeFilter::accept_all())?;
//! orch.on_publish(|artifact| println!("v{}", artifact.version()));
//! let js = orch.current_text();
//! ```

pub mod logger;

pub mod bundle;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod freshness;
pub mod graph;
pub mod monitor;
pub mod orchestrator;
pub mod reload;
pub mod utils;
pub mod workspace;

pub use bundle::{Artifact, Bundler};
pub use error::{Error, Result};
pub use monitor::{ChangeFilter, Changeset, EventKind};
pub use orchestrator::{Orchestrator, PipelineOptions, Rebuild};
pub use workspace::Workspace;
