use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::EventKind;

/// Paths changed within one debounce window.
///
/// Deduplicated by path with the latest kind winning; iterates in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    entries: BTreeMap<PathBuf, EventKind>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: EventKind, path: PathBuf) {
        self.entries.insert(path, kind);
    }

    /// Fold a later changeset into this one.
    pub fn merge(&mut self, later: Changeset) {
        self.entries.extend(later.entries);
    }

    pub fn kind_of(&self, path: &Path) -> Option<EventKind> {
        self.entries.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, EventKind)> {
        self.entries.iter().map(|(p, k)| (p.as_path(), *k))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
