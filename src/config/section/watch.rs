//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 100     # Quiet period before a rebuild
//! liveness_secs = 600   # Idle heartbeat (never triggers a rebuild)
//! capacity = 2048       # Buffered events before backpressure is fatal
//! ignore = [".ts"]      # Path suffixes that never trigger a rebuild
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::monitor::{ChangeFilter, DEFAULT_CAPACITY, MonitorOptions};

/// File watching settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub liveness_secs: u64,
    pub capacity: usize,
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            liveness_secs: 600,
            capacity: DEFAULT_CAPACITY,
            ignore: vec![".ts".to_string()],
        }
    }
}

impl WatchConfig {
    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            liveness: Duration::from_secs(self.liveness_secs),
            capacity: self.capacity,
        }
    }

    pub fn change_filter(&self) -> ChangeFilter {
        ChangeFilter::ignore_suffixes(self.ignore.iter().cloned())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10_000).contains(&self.debounce_ms) {
            return Err(ConfigError::invalid("watch.debounce_ms", "must be within 1..=10000"));
        }
        if !(1..=86_400).contains(&self.liveness_secs) {
            return Err(ConfigError::invalid("watch.liveness_secs", "must be within 1..=86400"));
        }
        if self.capacity == 0 {
            return Err(ConfigError::invalid("watch.capacity", "must be positive"));
        }
        Ok(())
    }
}
