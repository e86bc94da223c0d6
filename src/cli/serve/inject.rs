//! Live reload snippet injection.
//!
//! A response is left alone when any of these hold:
//!
//! | Check              | Skips                                        |
//! |--------------------|----------------------------------------------|
//! | content type       | anything that is not `text/html`             |
//! | transfer encoding  | `Transfer-Encoding: chunked`                 |
//! | disposition        | `Content-Disposition: inline...`             |
//! | `serve.ignore`     | request path (with query) matching a pattern |
//! | `serve.blocked_agents` | user agent matching a pattern            |
//!
//! Otherwise the snippet goes right after the first `<head>` tag. Pages
//! without one are sent unchanged.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use regex::bytes::Regex as BytesRegex;

use super::response::{Reply, RequestInfo};
use crate::config::ServeSection;
use crate::embed::serve::{SNIPPET_HTML, SnippetVars};
use crate::utils::mime;

/// Marks responses that carry the snippet.
pub const INJECTED_HEADER: &str = "X-Hawkins-LiveReload";

/// `<head>` or `<head attr...>`, never `<header>`.
static HEAD_TAG: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"(?i)<head(?:\s[^<>]*)?>").unwrap());

#[derive(Debug)]
pub struct ResponseInjector {
    ignore: Vec<Regex>,
    blocked_agents: Vec<Regex>,
    host: String,
    tls: bool,
    min_delay: u64,
    max_delay: u64,
    legacy: bool,
}

impl ResponseInjector {
    pub fn new(serve: &ServeSection) -> Result<Self> {
        let compile = |field: &str, patterns: &[String]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| Regex::new(p).with_context(|| format!("invalid `{field}` pattern")))
                .collect()
        };
        Ok(Self {
            ignore: compile("serve.ignore", &serve.ignore)?,
            blocked_agents: compile("serve.blocked_agents", &serve.blocked_agents)?,
            host: serve.host.clone(),
            tls: serve.tls,
            min_delay: serve.min_delay,
            max_delay: serve.max_delay,
            legacy: serve.legacy_fallback,
        })
    }

    /// Whether `reply` to `request` must be sent untouched.
    pub fn should_skip(&self, request: &RequestInfo, reply: &Reply) -> bool {
        !reply.header("Content-Type").is_some_and(mime::is_html)
            || reply
                .header("Transfer-Encoding")
                .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
            || reply
                .header("Content-Disposition")
                .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("inline"))
            || self.ignore.iter().any(|re| re.is_match(&request.url))
            || request
                .user_agent
                .as_deref()
                .is_some_and(|ua| self.blocked_agents.iter().any(|re| re.is_match(ua)))
    }

    /// Rendered snippet for a reload channel on `port`.
    pub fn snippet(&self, port: u16) -> String {
        SNIPPET_HTML.render(&SnippetVars {
            host: self.host.clone(),
            port,
            tls: self.tls,
            min_delay: self.min_delay,
            max_delay: self.max_delay,
            legacy: self.legacy,
        })
    }

    /// Insert the snippet into `reply` when allowed. Returns whether it was.
    pub fn apply(&self, request: &RequestInfo, reply: &mut Reply, port: u16) -> bool {
        if self.should_skip(request, reply) {
            return false;
        }
        let Some(body) = insert_after_head(&reply.body, self.snippet(port).as_bytes()) else {
            return false;
        };
        reply.body = body;
        reply.set_content_length();
        reply.set_header(INJECTED_HEADER, "1");
        true
    }
}

/// Copy of `body` with `snippet` after the first head tag, `None` without one.
fn insert_after_head(body: &[u8], snippet: &[u8]) -> Option<Vec<u8>> {
    let end = HEAD_TAG.find(body)?.end();
    let mut out = Vec::with_capacity(body.len() + snippet.len());
    out.extend_from_slice(&body[..end]);
    out.extend_from_slice(snippet);
    out.extend_from_slice(&body[end..]);
    Some(out)
}
