//! Pipeline error types.
//!
//! Resolution, read and bundle failures are recoverable during a rebuild: the
//! orchestrator logs them and keeps the previous artifact. Watch setup and
//! backpressure failures are fatal.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve `{specifier}`{}", referrer_suffix(.referrer.as_deref()))]
    Resolution {
        specifier: String,
        /// Module containing the reference (`None` for the entry point)
        referrer: Option<PathBuf>,
    },

    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot bundle `{module}`: {reason}")]
    Bundle { module: String, reason: String },

    #[error("failed to watch `{}`", .root.display())]
    WatchSetup {
        root: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watch event buffer overflowed (capacity {capacity}), rebuilds can no longer keep up")]
    Backpressure { capacity: usize },

    #[error("failed to start {what}")]
    Spawn {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn resolution(specifier: &str, referrer: Option<&Path>) -> Self {
        Self::Resolution {
            specifier: specifier.to_string(),
            referrer: referrer.map(Path::to_path_buf),
        }
    }

    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Fatal errors end the serve loop; the rest only abandon one rebuild.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WatchSetup { .. } | Self::Backpressure { .. } | Self::Spawn { .. }
        )
    }

    /// The entry point itself could not be resolved.
    pub fn is_entry_resolution(&self) -> bool {
        matches!(self, Self::Resolution { referrer: None, .. })
    }
}

fn referrer_suffix(referrer: Option<&Path>) -> String {
    match referrer {
        Some(path) => format!(" (required from `{}`)", path.display()),
        None => " (entry point)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display_names_referrer() {
        let err = Error::resolution("./missing", Some(Path::new("/ws/app.js")));
        let display = err.to_string();
        assert!(display.contains("./missing"));
        assert!(display.contains("/ws/app.js"));

        let entry = Error::resolution("app", None);
        assert!(entry.to_string().contains("entry point"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Backpressure { capacity: 4 }.is_fatal());
        assert!(!Error::resolution("x", None).is_fatal());
        assert!(
            !Error::Bundle {
                module: "a.js".into(),
                reason: "unterminated string".into(),
            }
            .is_fatal()
        );
    }
}
