//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! root = "."                            # Workspace root (relative to swarm.toml)
//! entry = "app/src/ep/app"              # Entry specifier
//! extensions = [".js", ".mjs", ".cjs"]  # Tried in order during resolution
//! output = "dist/app.js"                # Also write each bundle here
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::workspace::DEFAULT_EXTENSIONS;

pub const DEFAULT_ENTRY: &str = "app/src/ep/app";

/// Bundling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Workspace root; `~` is expanded, relative paths resolve against the
    /// config file's directory.
    pub root: PathBuf,

    /// Entry specifier, resolved like any root-relative specifier.
    pub entry: String,

    /// Extensions appended during resolution, in order.
    pub extensions: Vec<String>,

    /// Optional bundle file written after each publish.
    pub output: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: DEFAULT_ENTRY.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            output: None,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry.trim().is_empty() {
            return Err(ConfigError::invalid("build.entry", "must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::invalid("build.extensions", "needs at least one extension"));
        }
        if let Some(bad) = self.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            return Err(ConfigError::invalid(
                "build.extensions",
                format!("`{bad}` must start with `.`"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.entry, "app/src/ep/app");
        assert_eq!(config.build.extensions, vec![".js", ".mjs", ".cjs"]);
        assert!(config.build.output.is_none());
    }

    #[test]
    fn test_build_config_custom() {
        let config = test_parse_config(
            "[build]\nentry = \"src/main\"\nextensions = [\".js\"]\noutput = \"dist/main.js\"",
        );
        assert_eq!(config.build.entry, "src/main");
        assert_eq!(config.build.extensions, vec![".js"]);
        assert_eq!(config.build.output.as_deref(), Some(std::path::Path::new("dist/main.js")));
    }

    #[test]
    fn test_build_config_rejects_bad_extension() {
        let config = test_parse_config("[build]\nextensions = [\"js\"]");
        assert!(config.build.validate().is_err());

        let config = test_parse_config("[build]\nentry = \" \"");
        assert!(config.build.validate().is_err());
    }
}
