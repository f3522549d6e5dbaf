//! Module graph discovery.
//!
//! Starting from one entry specifier, follow every `require` reference and
//! collect the reachable modules exactly once, in dependency-first order.
//!
//! ```text
//! entry ──scan──> specifiers ──resolve──> modules ──post-order──> [deps.., entry]
//! ```
//!
//! Modules live in an arena addressed by [`ModuleId`]. A module is marked
//! visited before its dependencies are walked, which is what keeps cycles,
//! self-references and diamonds from being entered twice.

mod builder;
mod cache;
pub mod scan;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::freshness::ContentHash;

pub use builder::{build, build_with_cache};
pub use cache::ScanCache;
pub use scan::{DefectKind, LexDefect, ScanOutcome};

/// Stable index of a module inside one [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One resolved source file.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    /// Canonical absolute path (identity)
    pub path: PathBuf,
    /// Root-relative key used as the bundle registry id
    pub key: String,
    pub source: String,
    /// Specifiers in source order, deduplicated
    pub specifiers: Vec<String>,
    /// Resolved edges, one per specifier, in the same order
    pub deps: Vec<(String, ModuleId)>,
    pub fingerprint: ContentHash,
    /// Unterminated construct found while scanning
    pub defect: Option<LexDefect>,
}

/// Deduplicated modules reachable from an entry point.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<PathBuf, ModuleId>,
    order: Vec<ModuleId>,
    entry: ModuleId,
}

impl ModuleGraph {
    #[inline]
    pub fn entry(&self) -> &Module {
        self.get(self.entry)
    }

    #[inline]
    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn lookup(&self, path: &Path) -> Option<&Module> {
        self.index.get(path).map(|&id| self.get(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in emission order (dependencies first, entry last).
    pub fn ordered(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().map(|&id| self.get(id))
    }

    /// Module keys in emission order.
    pub fn keys(&self) -> Vec<&str> {
        self.ordered().map(|m| m.key.as_str()).collect()
    }

    /// Position of a module in emission order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.ordered().position(|m| m.key == key)
    }
}
