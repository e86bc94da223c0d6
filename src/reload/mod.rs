//! Reload Module
//!
//! Live reload building blocks that carry no actor state.
//!
//! # Modules
//!
//! - `classify` - Changed source path categorization (renderable, static, ignored)
//! - `message` - LiveReload wire messages (hello, reload, url)
//! - `server` - Single-purpose reload port (WebSocket upgrade + client script)

pub mod classify;
pub mod message;
pub mod server;
