use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;

use super::Pipeline;
use crate::error::{Error, Result};
use crate::monitor::Changeset;

pub(super) enum Job {
    Rebuild(Changeset),
    Shutdown,
}

/// Spawn the thread that runs every change-driven rebuild.
///
/// Changesets queued while a build runs are merged into the next one, so the
/// worker always catches up to the latest filesystem state in one build.
pub(super) fn spawn(pipeline: Arc<Pipeline>, jobs: Receiver<Job>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("rebuild-worker".into())
        .spawn(move || run(&pipeline, &jobs))
        .map_err(|source| Error::Spawn {
            what: "rebuild worker",
            source,
        })
}

fn run(pipeline: &Pipeline, jobs: &Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        let Job::Rebuild(mut changes) = job else {
            break;
        };

        let mut shutdown = false;
        for queued in jobs.try_iter() {
            match queued {
                Job::Rebuild(more) => changes.merge(more),
                Job::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }

        if shutdown || pipeline.is_stopped() {
            break;
        }
        pipeline.rebuild_for(&changes);
    }
    crate::debug!("watch"; "rebuild worker exited");
}
