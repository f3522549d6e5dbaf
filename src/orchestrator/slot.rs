use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::bundle::Artifact;

/// The artifact currently being served.
///
/// Readers copy an `Arc` and never wait for a rebuild; a publish swaps the
/// pointer in one step, so a reader sees either the old or the new artifact.
pub struct PublishedSlot {
    current: ArcSwap<Artifact>,
}

impl PublishedSlot {
    pub fn new(initial: Artifact) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    #[inline]
    pub fn load(&self) -> Arc<Artifact> {
        self.current.load_full()
    }

    /// Replace the served artifact, returning the new handle.
    pub fn publish(&self, artifact: Artifact) -> Arc<Artifact> {
        let artifact = Arc::new(artifact);
        self.current.store(Arc::clone(&artifact));
        artifact
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }
}
