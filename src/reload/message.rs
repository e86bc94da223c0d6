//! Live Reload Message Protocol
//!
//! JSON messages exchanged with browser clients over the reload channel,
//! following the LiveReload protocol (`official-7`).
//!
//! # Message Types
//!
//! - `hello`: handshake, sent by the server on connect (clients may send one too)
//! - `reload`: a page or asset changed (server → client)
//! - `url`: the page a client is showing (client → server, informational)

use serde::{Deserialize, Serialize};

/// Protocol identifiers advertised in the handshake.
pub const PROTOCOLS: &[&str] = &["http://livereload.com/protocols/official-7"];

/// Server name advertised in the handshake.
pub const SERVER_NAME: &str = "hawkins";

/// Live reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ReloadMessage {
    Hello {
        #[serde(default)]
        protocols: Vec<String>,
        #[serde(rename = "serverName", default, skip_serializing_if = "Option::is_none")]
        server_name: Option<String>,
    },

    Reload {
        /// Output path of the changed page, e.g. `/a/index.html`
        path: String,
        /// Stylesheets may be swapped in place
        #[serde(rename = "liveCSS", default)]
        live_css: bool,
    },

    Url {
        url: String,
    },

    /// Any other command a client might send (`info`, plugin messages).
    #[serde(other)]
    Unknown,
}

impl ReloadMessage {
    /// Server handshake.
    pub fn hello() -> Self {
        Self::Hello {
            protocols: PROTOCOLS.iter().map(ToString::to_string).collect(),
            server_name: Some(SERVER_NAME.to_string()),
        }
    }

    /// Reload notification for one output page.
    pub fn reload(path: impl Into<String>) -> Self {
        Self::Reload {
            path: path.into(),
            live_css: true,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn value(msg: &ReloadMessage) -> Value {
        serde_json::from_str(&msg.to_json()).unwrap()
    }

    #[test]
    fn test_hello_wire_format() {
        assert_eq!(
            value(&ReloadMessage::hello()),
            json!({
                "command": "hello",
                "protocols": ["http://livereload.com/protocols/official-7"],
                "serverName": "hawkins"
            })
        );
    }

    #[test]
    fn test_reload_wire_format() {
        assert_eq!(
            value(&ReloadMessage::reload("/a/index.html")),
            json!({"command": "reload", "path": "/a/index.html", "liveCSS": true})
        );
    }

    #[test]
    fn test_parse_client_messages() {
        assert_eq!(
            ReloadMessage::from_json(r#"{"command":"url","url":"http://localhost:4000/"}"#),
            Some(ReloadMessage::Url {
                url: "http://localhost:4000/".into()
            })
        );

        let hello = ReloadMessage::from_json(
            r#"{"command":"hello","protocols":["http://livereload.com/protocols/official-7"]}"#,
        );
        assert!(matches!(hello, Some(ReloadMessage::Hello { server_name: None, .. })));

        assert_eq!(
            ReloadMessage::from_json(r#"{"command":"info","plugins":{},"url":"/"}"#),
            Some(ReloadMessage::Unknown)
        );
    }

    #[test]
    fn test_malformed_messages() {
        assert_eq!(ReloadMessage::from_json("not json"), None);
        assert_eq!(ReloadMessage::from_json(r#"{"url":"/"}"#), None);
        // `url` without its payload
        assert_eq!(ReloadMessage::from_json(r#"{"command":"url"}"#), None);
    }
}
