//! Embedded static resources for hawkins.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server templates (snippet, holding page, loading page)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{HOLDING_HTML, HoldingVars};
//!
//! let vars = HoldingVars { path: "/2024/hello/".into(), stem: "hello".into() };
//! let html = HOLDING_HTML.render(&vars);
//! ```

mod template;

pub use template::{Template, TemplateVars};

/// LiveReload client served on the reload port.
pub const LIVERELOAD_JS: &str = include_str!("serve/livereload.js");

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::reload::server::CLIENT_PATH;

    /// Variables for the injected live reload snippet.
    pub struct SnippetVars {
        pub host: String,
        pub port: u16,
        pub tls: bool,
        pub min_delay: u64,
        pub max_delay: u64,
        pub legacy: bool,
    }

    impl SnippetVars {
        /// `ws` or `wss`, matching the page's scheme.
        pub const fn protocol(&self) -> &'static str {
            if self.tls { "wss" } else { "ws" }
        }

        /// Client script URL on the reload port.
        pub fn source(&self) -> String {
            let scheme = if self.tls { "https" } else { "http" };
            format!(
                "{scheme}://{}:{}{CLIENT_PATH}?mindelay={}&amp;maxdelay={}&amp;port={}",
                self.host, self.port, self.min_delay, self.max_delay, self.port
            )
        }
    }

    impl TemplateVars for SnippetVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__LEGACY__", if self.legacy { LEGACY_HTML } else { "" })
                .replace("__PORT__", &self.port.to_string())
                .replace("__PROTOCOL__", self.protocol())
                .replace("__SRC__", &self.source())
        }
    }

    /// Script block inserted after `<head>`.
    pub const SNIPPET_HTML: Template<SnippetVars> =
        Template::new(include_str!("serve/snippet.html"));

    /// References for browsers without native WebSocket support. The files
    /// are expected under `/__rack/` in the site itself.
    const LEGACY_HTML: &str = include_str!("serve/legacy.html");

    /// Variables for holding.html.
    pub struct HoldingVars {
        /// Request path being rendered
        pub path: String,
        /// Page name the client waits for a `reload` of
        pub stem: String,
    }

    impl TemplateVars for HoldingVars {
        fn apply(&self, content: &str) -> String {
            let stem = serde_json::to_string(&self.stem).unwrap_or_else(|_| "\"\"".into());
            content
                .replace("__PATH__", &escape(&self.path))
                .replace("__STEM__", &escape_script(&stem))
        }
    }

    /// Page served while a newly isolated page waits for the next rebuild.
    pub const HOLDING_HTML: Template<HoldingVars> =
        Template::new(include_str!("serve/holding.html"));

    /// Self-refreshing page served until the initial build completes.
    pub const LOADING_HTML: &str = include_str!("serve/loading.html");

    /// Keep a JSON literal from closing the surrounding `<script>`.
    fn escape_script(json: &str) -> String {
        json.replace('<', "\\u003c")
    }

    fn escape(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        out
    }

}
