//! Development server with live reload support.
//!
//! ```text
//! request ─► method check ─► resolve_path ─┬─ hit  ─► file_reply ─┐
//!                                          └─ miss ─► on_miss ────┤
//!                                                                 ▼
//!                                           snippet injection, site headers
//! ```

mod expand;
mod inject;
mod lifecycle;
mod path;
mod response;

pub use expand::IsolationExpander;
pub use inject::ResponseInjector;

use crate::{
    config::{BuildConfig, SiteConfig, cfg},
    core::{is_serving, is_shutdown, register_server},
    isolation::ScopeStore,
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use response::{Reply, RequestInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Conventional LiveReload port, the default for `serve.reload_port`.
pub const DEFAULT_RELOAD_PORT: u16 = 35729;

/// Port the reload channel actually bound, 0 while none is running.
static RELOAD_PORT: AtomicU16 = AtomicU16::new(0);

/// Record the bound reload port (called by the coordinator).
pub fn set_reload_port(port: u16) {
    RELOAD_PORT.store(port, Ordering::Relaxed);
}

fn reload_port() -> Option<u16> {
    match RELOAD_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// Serve the site until shutdown: bind, start the actors, run the HTTP loop.
pub fn serve_site(scope: Arc<ScopeStore>) -> Result<()> {
    let config = cfg();
    let build_config = Arc::new(BuildConfig::resolve(&config, scope.load().as_ref())?);
    let context = ServeContext::new(Arc::clone(&config), Arc::clone(&scope))?;
    bind_server()?.run(config, build_config, scope, context)
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop, so requests
/// arriving during the initial build get the loading page.
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the actors and the request loop (blocking).
    fn run(
        self,
        config: Arc<SiteConfig>,
        build_config: Arc<BuildConfig>,
        scope: Arc<ScopeStore>,
        context: ServeContext,
    ) -> Result<()> {
        let actor_handle = lifecycle::spawn_actors(config, build_config, scope, self.shutdown_rx);
        run_request_loop(&self.server, Arc::new(context))?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server, context: Arc<ServeContext>) -> Result<()> {
    // A slow disk read must not hold up other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let context = Arc::clone(&context);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &context) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, context: &ServeContext) -> Result<()> {
    let info = RequestInfo::from_request(&request);

    let reply = if is_shutdown() {
        response::unavailable()
    } else if !is_serving() {
        response::loading()
    } else {
        let port = context.inject.then(reload_port).flatten();
        context.route(&info, port).unwrap_or_else(|e| {
            log!("serve"; "{} {}: {:#}", info.method, info.url, e);
            Reply::new(500, crate::utils::mime::types::PLAIN, "500 Internal Server Error")
        })
    };

    crate::debug!("serve"; "{} {} -> {}", info.method, info.url, reply.status);
    reply.send(request)
}

/// Everything request routing needs, built once per session.
pub struct ServeContext {
    config: Arc<SiteConfig>,
    injector: ResponseInjector,
    expander: IsolationExpander,
    /// Live reload is on (`serve.watch`)
    inject: bool,
}

impl ServeContext {
    pub fn new(config: Arc<SiteConfig>, scope: Arc<ScopeStore>) -> Result<Self> {
        let injector = ResponseInjector::new(&config.serve)?;
        let expander = IsolationExpander::new(scope, config.destination_dir().to_path_buf());
        let inject = config.serve.watch;
        Ok(Self {
            config,
            injector,
            expander,
            inject,
        })
    }

    /// Build the reply for `request`. `reload_port` is the live reload
    /// channel to point injected pages at, if any.
    fn route(&self, request: &RequestInfo, reload_port: Option<u16>) -> Result<Reply> {
        if !request.is_read() {
            return Ok(response::method_not_allowed().with_site_headers(&self.config.serve));
        }

        let mut reply = match path::resolve_path(&request.url, self.config.destination_dir()) {
            Some(file) => response::file_reply(request, &file)?,
            None => self.expander.on_miss(&path::decode_path(&request.url)),
        };

        if let Some(port) = reload_port
            && reply.status != 304
        {
            self.injector.apply(request, &mut reply, port);
        }

        Ok(reply.with_site_headers(&self.config.serve))
    }
}

#[cfg(test)]
mod tests {
    use super::inject::INJECTED_HEADER;
    use super::*;
    use crate::config::test_site_config;
    use crate::isolation::IsolationScope;
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = "<html><head><title>x</title></head><body>x</body></html>";

    fn setup() -> (TempDir, Arc<ScopeStore>, ServeContext) {
        let dir = TempDir::new().unwrap();
        let config = test_site_config(dir.path());
        let site = config.destination_dir().to_path_buf();
        fs::create_dir_all(site.join("blog")).unwrap();
        fs::write(site.join("index.html"), PAGE).unwrap();
        fs::write(site.join("blog/index.html"), PAGE).unwrap();
        fs::write(site.join("style.css"), "body{}").unwrap();

        let scope = Arc::new(ScopeStore::new(config.scope_path()));
        let context = ServeContext::new(Arc::new(config), Arc::clone(&scope)).unwrap();
        (dir, scope, context)
    }

    fn request(method: &str, url: &str) -> RequestInfo {
        RequestInfo {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_serves_and_injects_html() {
        let (_dir, _scope, ctx) = setup();
        let reply = ctx.route(&request("GET", "/blog/"), Some(35729)).unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.header(INJECTED_HEADER), Some("1"));
        assert_eq!(
            reply.header("Content-Length"),
            Some(reply.body.len().to_string().as_str())
        );
        assert!(reply.header("Cache-Control").is_some());
    }

    #[test]
    fn test_no_injection_without_reload_channel() {
        let (_dir, _scope, ctx) = setup();
        let reply = ctx.route(&request("GET", "/"), None).unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, PAGE.as_bytes());
        assert!(reply.header(INJECTED_HEADER).is_none());
    }

    #[test]
    fn test_assets_pass_through() {
        let (_dir, _scope, ctx) = setup();
        let reply = ctx.route(&request("GET", "/style.css"), Some(35729)).unwrap();

        assert_eq!(reply.body, b"body{}");
        assert!(reply.header(INJECTED_HEADER).is_none());
    }

    #[test]
    fn test_rejects_writes() {
        let (_dir, _scope, ctx) = setup();
        let reply = ctx.route(&request("POST", "/"), Some(35729)).unwrap();
        assert_eq!(reply.status, 405);
    }

    #[test]
    fn test_miss_without_scope_is_404() {
        let (_dir, scope, ctx) = setup();
        let reply = ctx.route(&request("GET", "/nope.html"), Some(35729)).unwrap();

        assert_eq!(reply.status, 404);
        assert!(!scope.exists());
    }

    #[test]
    fn test_miss_in_isolation_widens_once() {
        let (_dir, scope, ctx) = setup();
        scope.save(&IsolationScope::default()).unwrap();

        let first = ctx.route(&request("GET", "/2024/01/hello.html"), Some(35729)).unwrap();
        assert_eq!(first.status, 200);
        // the holding page listens for its own rebuild
        assert_eq!(first.header(INJECTED_HEADER), Some("1"));
        assert_eq!(scope.load().unwrap().include, vec!["hello.*"]);

        let second = ctx.route(&request("GET", "/2024/01/hello.html"), Some(35729)).unwrap();
        assert_eq!(second.status, 404);
    }

    #[test]
    fn test_miss_widens_decoded_name() {
        let (_dir, scope, ctx) = setup();
        scope.save(&IsolationScope::default()).unwrap();

        let reply = ctx.route(&request("GET", "/2024/caf%C3%A9.html?x=1"), Some(35729)).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(scope.load().unwrap().include, vec!["café.*"]);
        let body = String::from_utf8(reply.body).unwrap();
        assert!(body.contains(r#"HAWKINS_LIVERELOAD_PENDING = "café";"#));
    }
}
