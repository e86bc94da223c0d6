//! Hub Actor - push-channel connections and reload broadcast
//!
//! ```text
//! reload server --AddClient--> HubActor <--Reload-- BuildActor
//!                                 |
//!                                 +--reload per page--> browsers
//! ```
//!
//! Handshakes run on blocking threads and a reader thread polls sockets,
//! so neither a slow browser nor a burst of connects holds up a broadcast.

mod connection;


use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::messages::HubMsg;
use crate::reload::message::ReloadMessage;
use connection::Connection;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Connections = Arc<Mutex<Vec<Connection>>>;

pub struct HubActor {
    rx: mpsc::Receiver<HubMsg>,
    connections: Connections,
    next_id: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
}

impl HubActor {
    pub fn new(rx: mpsc::Receiver<HubMsg>) -> Self {
        Self {
            rx,
            connections: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        let connections = Arc::clone(&self.connections);
        let stopped = Arc::clone(&self.stopped);
        std::thread::spawn(move || reader_loop(&connections, &stopped));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                HubMsg::AddClient(stream) => self.add_client(stream),
                HubMsg::Reload { pages } => {
                    let sent = broadcast(&mut self.connections.lock(), &pages);
                    crate::debug!("reload"; "{} page(s), {} message(s) sent", pages.len(), sent);
                }
                HubMsg::Shutdown => break,
            }
        }

        self.stopped.store(true, Ordering::SeqCst);
        let mut connections = self.connections.lock();
        for conn in connections.iter_mut() {
            conn.close();
        }
        connections.clear();
        crate::debug!("reload"; "hub stopped");
    }

    fn add_client(&self, stream: TcpStream) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let connections = Arc::clone(&self.connections);
        tokio::task::spawn_blocking(move || register(id, stream, &connections));
    }
}

/// Upgrade, then greet under the lock: a client that has seen the hello is
/// guaranteed to be in the broadcast set.
fn register(id: u64, stream: TcpStream, connections: &Mutex<Vec<Connection>>) {
    let mut conn = match Connection::accept(id, stream) {
        Ok(conn) => conn,
        Err(e) => {
            crate::log!("reload"; "client {}: {:#}", id, e);
            return;
        }
    };
    let mut connections = connections.lock();
    if conn.greet() {
        crate::debug!("reload"; "client {} connected (total: {})", id, connections.len() + 1);
        connections.push(conn);
    }
}

/// Send one `reload` per page to every open connection, in page order.
/// Connections that fail are dropped. Returns the number of messages sent.
fn broadcast(connections: &mut Vec<Connection>, pages: &[String]) -> usize {
    let mut sent = 0;
    for page in pages {
        let msg = ReloadMessage::reload(page.as_str());
        for conn in connections.iter_mut() {
            if conn.send(&msg) {
                sent += 1;
            }
        }
    }
    connections.retain(Connection::is_open);
    sent
}

/// Poll every connection for inbound messages and drop closed ones.
fn poll_all(connections: &mut Vec<Connection>) {
    connections.retain_mut(|conn| {
        conn.poll();
        conn.is_open()
    });
}

fn reader_loop(connections: &Mutex<Vec<Connection>>, stopped: &AtomicBool) {
    while !stopped.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);
        poll_all(&mut connections.lock());
    }
}
