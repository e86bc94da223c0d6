//! HTTP responses, built as plain values before they reach `tiny_http`.
//!
//! Keeping [`Reply`] independent of the socket lets the routing, injection
//! and expansion logic be exercised without a server.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Request, Response, StatusCode};

use crate::config::ServeSection;
use crate::utils::{httpdate, mime};

/// Sent with every served file unless `serve.headers` overrides it.
pub const DEFAULT_CACHE_CONTROL: &str =
    "private, max-age=0, proxy-revalidate, no-store, no-cache, must-revalidate";

/// The request fields routing cares about.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: String,
    /// Raw request target, including any query string
    pub url: String,
    pub user_agent: Option<String>,
    pub if_modified_since: Option<String>,
}

impl RequestInfo {
    pub fn from_request(request: &Request) -> Self {
        let header = |name: &str| {
            request
                .headers()
                .iter()
                .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
                .map(|h| h.value.to_string())
        };
        Self {
            method: request.method().as_str().to_ascii_uppercase(),
            url: request.url().to_string(),
            user_agent: header("User-Agent"),
            if_modified_since: header("If-Modified-Since"),
        }
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn is_read(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }
}

/// A response about to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut reply = Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        };
        reply.set_header("Content-Type", content_type);
        reply.set_content_length();
        reply
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace any existing value for `name`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// `Content-Length` from the body's byte length.
    pub fn set_content_length(&mut self) {
        let len = self.body.len().to_string();
        self.set_header("Content-Length", len);
    }

    /// Default headers, then the configured ones on top.
    pub fn with_site_headers(mut self, serve: &ServeSection) -> Self {
        if self.header("Cache-Control").is_none() {
            self.set_header("Cache-Control", DEFAULT_CACHE_CONTROL);
        }
        for (name, value) in &serve.headers {
            self.set_header(name, value.as_str());
        }
        self
    }

    /// Hand the reply to `tiny_http`. HEAD bodies are dropped by the server.
    pub fn send(self, request: Request) -> Result<()> {
        let mut headers = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            // tiny_http computes the length itself from the data length
            if name.eq_ignore_ascii_case("Content-Length") {
                continue;
            }
            match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => headers.push(header),
                Err(()) => crate::debug!("serve"; "dropping invalid header {}", name),
            }
        }
        let len = self.body.len();
        let response = Response::new(
            StatusCode(self.status),
            headers,
            Cursor::new(self.body),
            Some(len),
            None,
        );
        request.respond(response)?;
        Ok(())
    }
}

/// Append a UTF-8 charset to text types that lack one.
pub fn ensure_charset(content_type: &str) -> String {
    if mime::is_text(content_type) && !content_type.to_ascii_lowercase().contains("charset=") {
        format!("{content_type}; charset=utf-8")
    } else {
        content_type.to_string()
    }
}

/// Serve a file from the destination tree, honoring `If-Modified-Since`.
pub fn file_reply(request: &RequestInfo, path: &Path) -> Result<Reply> {
    let meta = fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let last_modified = meta.modified().ok().map(httpdate::format);
    let content_type = ensure_charset(mime::from_path(path));

    if let (Some(since), Some(modified)) = (&request.if_modified_since, &last_modified)
        && since.trim() == modified.as_str()
    {
        let mut reply = Reply::new(304, &content_type, Vec::new());
        reply.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("Content-Length"));
        reply.set_header("Last-Modified", modified.as_str());
        return Ok(reply);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut reply = Reply::new(200, &content_type, body);
    if let Some(modified) = last_modified {
        reply.set_header("Last-Modified", modified);
    }
    Ok(reply)
}

/// Hard 404: the destination tree's own `404.html`, else plain text.
pub fn not_found(destination: &Path) -> Reply {
    match fs::read(destination.join("404.html")) {
        Ok(body) => Reply::new(404, mime::types::HTML, body),
        Err(_) => Reply::new(404, mime::types::PLAIN, "Not found"),
    }
}

/// Page served until the initial build completes.
pub fn loading() -> Reply {
    Reply::new(200, mime::types::HTML, crate::embed::serve::LOADING_HTML)
}

/// Server is shutting down.
pub fn unavailable() -> Reply {
    Reply::new(503, mime::types::PLAIN, "503 Service Unavailable")
}

pub fn method_not_allowed() -> Reply {
    let mut reply = Reply::new(405, mime::types::PLAIN, "405 Method Not Allowed");
    reply.set_header("Allow", "GET, HEAD");
    reply
}
