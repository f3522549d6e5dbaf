//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"             # Network interface (127.0.0.1 = localhost only)
//! port = 8096                         # HTTP port number
//! bundle_url = "/app/src/ep/app.js"   # Where the bundle is served
//! reload = true                       # Hot reload websocket + script injection
//! ws_port = 35729                     # Hot reload websocket port
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.
//! `bundle_url` defaults to `"/" + entry + ".js"`.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// URL path of the bundle. Derived from the entry when unset.
    pub bundle_url: Option<String>,

    /// Push reloads to connected browsers after each publish.
    pub reload: bool,

    /// Websocket port for reload notifications.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8096,
            bundle_url: None,
            reload: true,
            ws_port: 35729,
        }
    }
}

impl ServeConfig {
    /// Bundle URL, falling back to `"/" + entry + ".js"`.
    pub fn bundle_url_for(&self, entry: &str) -> String {
        match &self.bundle_url {
            Some(url) => url.clone(),
            None => format!("/{}.js", entry.trim_start_matches('/')),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.bundle_url
            && !url.starts_with('/')
        {
            return Err(ConfigError::invalid(
                "serve.bundle_url",
                format!("`{url}` must start with `/`"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nreload = false\nws_port = 4000",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 4000);
        assert!(!config.serve.reload);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 8096);
        assert!(config.serve.reload);
        assert_eq!(config.serve.bundle_url_for("app/src/ep/app"), "/app/src/ep/app.js");
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_bundle_url_must_be_absolute() {
        let config = test_parse_config("[serve]\nbundle_url = \"bundle.js\"");
        assert!(config.serve.validate().is_err());

        let config = test_parse_config("[serve]\nbundle_url = \"/static/bundle.js\"");
        assert!(config.serve.validate().is_ok());
        assert_eq!(config.serve.bundle_url_for("ignored"), "/static/bundle.js");
    }
}
