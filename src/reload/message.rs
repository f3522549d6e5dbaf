//! Reload message protocol.
//!
//! ```text
//! {"type":"connected"}             sent once per client after the handshake
//! {"type":"reload","version":7}    sent to every client after a publish
//! ```

use serde::{Deserialize, Serialize};

/// Message sent over the reload websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// A new bundle was published
    Reload {
        /// Version of the published artifact
        version: u64,
    },
}

impl ReloadMessage {
    pub fn reload(version: u64) -> Self {
        Self::Reload { version }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
