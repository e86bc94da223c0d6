//! Reload Channel Server
//!
//! Single-purpose port: WebSocket upgrades are handed to the HubActor,
//! `GET /livereload.js` returns the embedded client, and every other HTTP
//! request gets a `400`.
//!
//! Each accepted socket is routed on its own thread so a client that never
//! finishes its request line cannot stall the acceptor.

use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::HubMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Path the client script is served from.
pub const CLIENT_PATH: &str = "/livereload.js";

/// Request heads larger than this are rejected.
const MAX_HEAD: usize = 8 * 1024;

const MAX_HEADERS: usize = 64;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

const REJECT_BODY: &str = "This port only serves livereload.js over HTTP.\n";

/// Start the reload server. Returns the port actually bound.
pub fn start_reload_server(
    interface: IpAddr,
    base_port: u16,
    hub_tx: mpsc::Sender<HubMsg>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;
    if actual_port != base_port {
        crate::log!("reload"; "port {} in use, using {} instead", base_port, actual_port);
    }
    crate::debug!("reload"; "ws://{}", SocketAddr::new(interface, actual_port));

    std::thread::spawn(move || {
        while !crate::core::is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "connection from {}", addr);
                    let tx = hub_tx.clone();
                    std::thread::spawn(move || {
                        if let Err(e) = route_connection(stream, &tx) {
                            crate::debug!("reload"; "{}: {}", addr, e);
                        }
                    });
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Parsed request line plus the one header that matters here.
#[derive(Debug, PartialEq, Eq)]
struct RequestHead {
    method: String,
    path: String,
    upgrade: bool,
    /// Byte length including the terminating blank line
    len: usize,
}

/// What to do with a connection.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Upgrade,
    Client,
    Reject,
}

impl RequestHead {
    fn route(&self) -> Route {
        if self.upgrade {
            Route::Upgrade
        } else if self.method == "GET" && self.path == CLIENT_PATH {
            Route::Client
        } else {
            Route::Reject
        }
    }
}

/// Parse a complete request head, `None` while it is still partial.
fn parse_head(buf: &[u8]) -> Result<Option<RequestHead>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);
    let len = match request.parse(buf)? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let target = request.path.unwrap_or("/");
    let upgrade = request.headers.iter().any(|header| {
        header.name.eq_ignore_ascii_case("upgrade")
            && std::str::from_utf8(header.value).is_ok_and(|v| v.trim().eq_ignore_ascii_case("websocket"))
    });

    Ok(Some(RequestHead {
        method: request.method.unwrap_or_default().to_string(),
        path: target.split('?').next().unwrap_or(target).to_string(),
        upgrade,
        len,
    }))
}

/// Peek until the request head is complete, leaving it unread for the
/// WebSocket handshake.
fn peek_head(stream: &TcpStream) -> Result<RequestHead> {
    let mut buf = vec![0u8; MAX_HEAD];
    let mut last = 0;
    let deadline = Instant::now() + READ_TIMEOUT;
    loop {
        let n = stream.peek(&mut buf)?;
        if n == 0 {
            anyhow::bail!("closed before request");
        }
        if let Some(head) = parse_head(&buf[..n])? {
            return Ok(head);
        }
        if n == MAX_HEAD {
            anyhow::bail!("request head too large");
        }
        if Instant::now() > deadline {
            anyhow::bail!("incomplete request head");
        }
        if n == last {
            std::thread::sleep(Duration::from_millis(10));
        }
        last = n;
    }
}

fn route_connection(mut stream: TcpStream, hub_tx: &mpsc::Sender<HubMsg>) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let head = peek_head(&stream)?;

    match head.route() {
        Route::Upgrade => {
            stream.set_read_timeout(None)?;
            if hub_tx.blocking_send(HubMsg::AddClient(stream)).is_err() {
                crate::debug!("reload"; "hub stopped, dropping client");
            }
            Ok(())
        }
        route => {
            let mut consumed = vec![0u8; head.len];
            stream.read_exact(&mut consumed)?;
            let response = if route == Route::Client {
                http_response(
                    "200 OK",
                    "application/javascript",
                    crate::embed::LIVERELOAD_JS.as_bytes(),
                )
            } else {
                http_response("400 Bad Request", "text/plain; charset=utf-8", REJECT_BODY.as_bytes())
            };
            stream.write_all(&response)?;
            stream.flush()?;
            Ok(())
        }
    }
}

fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
