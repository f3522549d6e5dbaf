//! Project configuration for `swarm.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/    # [build], [serve], [watch]
//! ├── error       # ConfigError
//! ├── util        # Config file discovery, path resolution
//! └── mod.rs      # SwarmConfig (this file)
//! ```
//!
//! The file is optional: without one every section takes its defaults and the
//! workspace root is the current directory. Command-line flags are applied on
//! top by the CLI.

mod error;
mod section;
mod util;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use section::{BuildConfig, DEFAULT_ENTRY, ServeConfig, WatchConfig};
use util::{find_config_file, resolve_path};

use crate::orchestrator::PipelineOptions;

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "swarm.toml";

/// Root configuration structure representing swarm.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Absolute path of the loaded file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub base_dir: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl SwarmConfig {
    /// Load configuration.
    ///
    /// `explicit` names a file that must exist. Otherwise [`CONFIG_FILE`] is
    /// searched upward from `cwd`, and defaults are used when none is found.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let found = match explicit {
            Some(path) => {
                let path = resolve_path(path, cwd);
                if !path.is_file() {
                    return Err(ConfigError::Io(
                        path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                    ));
                }
                Some(path)
            }
            None => find_config_file(Path::new(CONFIG_FILE), cwd),
        };

        let mut config = match &found {
            Some(path) => Self::from_path(path)?,
            None => {
                crate::debug!("config"; "no {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        config.base_dir = found
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        config.config_path = found;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        crate::debug!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Validate every section, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build.validate()?;
        self.serve.validate()?;
        self.watch.validate()
    }

    /// Absolute workspace root.
    pub fn root_path(&self) -> PathBuf {
        resolve_path(&self.build.root, &self.base_dir)
    }

    /// Absolute bundle output path, if configured.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.build
            .output
            .as_deref()
            .map(|p| resolve_path(p, &self.base_dir))
    }

    pub fn bundle_url(&self) -> String {
        self.serve.bundle_url_for(&self.build.entry)
    }

    /// Everything the orchestrator needs, derived from this config.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new(self.root_path(), self.build.entry.clone())
            .with_extensions(self.build.extensions.clone())
            .with_filter(self.watch.change_filter())
            .with_monitor(self.watch.monitor_options())
            .with_output(self.output_path())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SwarmConfig {
    let (parsed, ignored) = SwarmConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        let result = SwarmConfig::parse_with_ignored("[build\nentry = \"x\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\nentry = \"main\"\nentyr = \"typo\"\n[unknown_section]\nfield = 1";
        let (config, ignored) = SwarmConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.build.entry, "main");
        assert!(ignored.iter().any(|f| f.contains("entyr")));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = SwarmConfig::load(None, temp.path()).unwrap();

        assert!(config.config_path.is_none());
        assert_eq!(config.root_path(), temp.path());
        assert_eq!(config.bundle_url(), "/app/src/ep/app.js");
    }

    #[test]
    fn test_load_resolves_relative_to_config_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[build]\nroot = \"web\"\noutput = \"dist/app.js\"",
        )
        .unwrap();
        let nested = temp.path().join("web/app");
        fs::create_dir_all(&nested).unwrap();

        let config = SwarmConfig::load(None, &nested).unwrap();
        assert_eq!(config.config_path, Some(temp.path().join(CONFIG_FILE)));
        assert_eq!(config.root_path(), temp.path().join("web"));
        assert_eq!(config.output_path(), Some(temp.path().join("dist/app.js")));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = SwarmConfig::load(Some(Path::new("nope.toml")), temp.path());
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[watch]\ncapacity = 0").unwrap();

        let result = SwarmConfig::load(None, temp.path());
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "watch.capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_pipeline_options() {
        let mut config = test_parse_config("[build]\nentry = \"main\"\n[watch]\ndebounce_ms = 40");
        config.base_dir = PathBuf::from("/project");

        let options = config.pipeline_options();
        assert_eq!(options.root, PathBuf::from("/project"));
        assert_eq!(options.entry, "main");
        assert_eq!(options.monitor.debounce.as_millis(), 40);
        assert!(options.output.is_none());
    }
}
