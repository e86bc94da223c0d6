//! `[serve]` section configuration.
//!
//! Contains development server and live reload settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 4000                 # HTTP port number
//! reload_port = 35729         # Live reload channel port
//! watch = true                # Auto-rebuild on file changes
//! host = "localhost"          # Host browsers use to reach the reload channel
//! tls = false                 # Reload channel behind TLS (wss/https)
//! min_delay = 500             # Client reconnect backoff bounds (ms)
//! max_delay = 2000
//! ignore = ["^/admin"]        # Request paths never injected (regex)
//! blocked_agents = ["MSIE"]   # User agents never injected (regex)
//! legacy_fallback = false     # Also reference the legacy transport shim
//!
//! [serve.headers]
//! X-Frame-Options = "DENY"
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr},
};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Live reload channel port.
    pub reload_port: u16,

    /// Enable file watcher for live reload.
    pub watch: bool,

    /// Host name written into the injected client reference.
    pub host: String,

    /// Reload channel is reached through TLS.
    pub tls: bool,

    /// Minimum reconnect delay forwarded to the client (ms).
    pub min_delay: u64,

    /// Maximum reconnect delay forwarded to the client (ms).
    pub max_delay: u64,

    /// Request path patterns that are never injected.
    pub ignore: Vec<String>,

    /// User agent patterns that are never injected.
    pub blocked_agents: Vec<String>,

    /// Emit references for clients without WebSocket support.
    pub legacy_fallback: bool,

    /// Extra response headers for every served file.
    pub headers: BTreeMap<String, String>,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 4000,
            reload_port: crate::cli::serve::DEFAULT_RELOAD_PORT,
            watch: true,
            host: "localhost".to_string(),
            tls: false,
            min_delay: 500,
            max_delay: 2000,
            ignore: Vec::new(),
            blocked_agents: vec!["MSIE".to_string()],
            legacy_fallback: false,
            headers: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nreload_port = 35730\nwatch = false",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.reload_port, 35730);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.serve.reload_port, 35729);
        assert!(config.serve.watch);
        assert_eq!(config.serve.host, "localhost");
        assert!(!config.serve.tls);
        assert_eq!((config.serve.min_delay, config.serve.max_delay), (500, 2000));
        assert_eq!(config.serve.blocked_agents, vec!["MSIE"]);
        assert!(config.serve.headers.is_empty());
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
    fn test_serve_headers_and_lists() {
        let config = test_parse_config(
            "[serve]\nignore = [\"^/admin\"]\nblocked_agents = []\n\n[serve.headers]\nX-Frame-Options = \"DENY\"",
        );

        assert_eq!(config.serve.ignore, vec!["^/admin"]);
        assert!(config.serve.blocked_agents.is_empty());
        assert_eq!(
            config.serve.headers.get("X-Frame-Options").map(String::as_str),
            Some("DENY")
        );
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\nport = 3000\ntls = true");

        assert_eq!(config.serve.port, 3000);
        assert!(config.serve.tls);
        assert_eq!(config.serve.reload_port, 35729);
        assert!(config.serve.watch);
    }
}
