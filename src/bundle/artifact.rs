use std::sync::Arc;
use std::time::Duration;

use crate::freshness::ContentHash;

/// A finished bundle plus the metadata served alongside it.
///
/// Immutable once built; every rebuild produces a new value.
#[derive(Debug, Clone)]
pub struct Artifact {
    text: Arc<str>,
    version: u64,
    fingerprint: ContentHash,
    module_count: usize,
    duration: Duration,
}

impl Artifact {
    pub fn new(text: impl Into<Arc<str>>, version: u64, module_count: usize) -> Self {
        let text = text.into();
        Self {
            fingerprint: ContentHash::of(text.as_bytes()),
            text,
            version,
            module_count,
            duration: Duration::ZERO,
        }
    }

    /// Version-0 script that reports a build failure in the browser console.
    pub fn placeholder(reason: &str) -> Self {
        let message = format!("[swarm] initial build failed: {reason}");
        let literal = serde_json::to_string(&message).unwrap_or_else(|_| "\"[swarm] build failed\"".into());
        Self::new(format!("console.error({literal});\n"), 0, 0)
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the text, cheap to hand to request threads.
    #[inline]
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    #[inline]
    pub fn module_count(&self) -> usize {
        self.module_count
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_placeholder(&self) -> bool {
        self.version == 0
    }

    /// Quoted HTTP entity tag.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.fingerprint)
    }

    /// Same content as `other`, regardless of version.
    pub fn same_content(&self, other: &Artifact) -> bool {
        self.fingerprint == other.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_tracks_text_not_version() {
        let a = Artifact::new("x();", 1, 1);
        let b = Artifact::new("x();", 2, 1);
        let c = Artifact::new("y();", 3, 1);
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
        assert_eq!(a.etag(), b.etag());
    }

    #[test]
    fn test_placeholder_reports_error() {
        let artifact = Artifact::placeholder("cannot bundle `a.js`: \"quoted\"");
        assert!(artifact.is_placeholder());
        assert!(artifact.text().starts_with("console.error(\""));
        assert!(artifact.text().contains("\\\"quoted\\\""));
    }
}
