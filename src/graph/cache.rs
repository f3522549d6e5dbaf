use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::scan::{ScanOutcome, scan};
use crate::freshness::ContentHash;

/// Scan results memoized by content fingerprint across rebuilds.
///
/// Only the scanner output is reused. Files are still read on every build and
/// resolution always looks at the filesystem, so the cache cannot go stale.
#[derive(Debug, Default)]
pub struct ScanCache {
    entries: Mutex<FxHashMap<ContentHash, ScanOutcome>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached outcome for `fingerprint`, scanning `source` on a miss.
    pub fn get_or_scan(&self, fingerprint: ContentHash, source: &str) -> ScanOutcome {
        if let Some(hit) = self.entries.lock().get(&fingerprint) {
            return hit.clone();
        }

        let outcome = scan(source);
        self.entries.lock().insert(fingerprint, outcome.clone());
        outcome
    }

    /// Drop entries whose content is no longer part of the graph.
    pub fn retain(&self, live: &FxHashSet<ContentHash>) {
        self.entries.lock().retain(|hash, _| live.contains(hash));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_reuses_outcome() {
        let cache = ScanCache::new();
        let source = "require('./a');";
        let hash = ContentHash::of(source);

        let first = cache.get_or_scan(hash, source);
        // A hit never looks at the source again
        let second = cache.get_or_scan(hash, "");
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_prunes_dead_entries() {
        let cache = ScanCache::new();
        let live = ContentHash::of("live");
        cache.get_or_scan(live, "live");
        cache.get_or_scan(ContentHash::of("dead"), "dead");

        let keep: FxHashSet<_> = [live].into_iter().collect();
        cache.retain(&keep);
        assert_eq!(cache.len(), 1);
    }
}
