//! Content fingerprints using blake3.
//!
//! Modules are fingerprinted to memoize their scanned specifiers across
//! rebuilds; artifacts are fingerprinted to skip publishing identical output
//! and to serve as the HTTP `ETag`.

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash raw bytes.
    #[inline]
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Hash representing "no content" (all zeros).
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 32])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars are plenty for display and ETags
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_same_hash() {
        assert_eq!(ContentHash::of("module.exports = 1;"), ContentHash::of("module.exports = 1;"));
        assert_ne!(ContentHash::of("a"), ContentHash::of("b"));
    }

    #[test]
    fn test_empty_hash() {
        assert!(ContentHash::empty().is_empty());
        assert!(!ContentHash::of("").is_empty());
    }

    #[test]
    fn test_display_is_short_hex() {
        let display = ContentHash::of("x").to_string();
        assert_eq!(display.len(), 16);
        assert!(display.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
