use std::io::ErrorKind;
use std::net::TcpStream;

use anyhow::{Result, anyhow};
use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

use crate::reload::message::ReloadMessage;

/// Connection lifecycle. Ids are never reused and a closed connection is
/// never reopened.
///
/// ```text
/// Handshaking --upgrade + hello--> HelloSent --client speaks--> Active
///       any --close / io error--> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConnState {
    Handshaking,
    HelloSent,
    Active,
    Closed,
}

pub(super) struct Connection {
    pub(super) id: u64,
    ws: WebSocket<TcpStream>,
    pub(super) state: ConnState,
}

impl Connection {
    /// Complete the WebSocket upgrade (blocking). The hello is sent
    /// separately so the caller can register the connection first.
    pub(super) fn accept(id: u64, stream: TcpStream) -> Result<Self> {
        let ws = tungstenite::accept(stream).map_err(|e| anyhow!("handshake failed: {e}"))?;
        Ok(Self {
            id,
            ws,
            state: ConnState::Handshaking,
        })
    }

    /// Send the server hello and switch to non-blocking reads.
    pub(super) fn greet(&mut self) -> bool {
        if !self.send(&ReloadMessage::hello()) {
            return false;
        }
        self.state = ConnState::HelloSent;
        if let Err(e) = self.ws.get_ref().set_nonblocking(true) {
            crate::debug!("reload"; "client {}: {}", self.id, e);
            self.state = ConnState::Closed;
            return false;
        }
        true
    }

    pub(super) fn is_open(&self) -> bool {
        self.state != ConnState::Closed
    }

    /// Send one message. A failure closes the connection.
    pub(super) fn send(&mut self, msg: &ReloadMessage) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.ws.send(Message::Text(msg.to_json().into())) {
            Ok(()) => true,
            // queued in the write buffer, flushed by the next send or poll
            Err(WsError::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
            Err(e) => {
                crate::debug!("reload"; "client {} dropped: {}", self.id, e);
                self.state = ConnState::Closed;
                false
            }
        }
    }

    /// Drain readable messages without blocking.
    pub(super) fn poll(&mut self) {
        while self.is_open() {
            match self.ws.read() {
                Ok(Message::Text(text)) => self.on_text(text.as_str()),
                Ok(Message::Close(_)) => {
                    crate::debug!("reload"; "client {} closed", self.id);
                    self.state = ConnState::Closed;
                }
                Ok(_) => {}
                Err(WsError::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    crate::debug!("reload"; "client {} dropped: {}", self.id, e);
                    self.state = ConnState::Closed;
                }
            }
        }
        if self.is_open() {
            let _ = self.ws.flush();
        }
    }

    fn on_text(&mut self, text: &str) {
        match ReloadMessage::from_json(text) {
            Some(ReloadMessage::Url { url }) => {
                crate::debug!("reload"; "client {} viewing {}", self.id, url);
                self.state = ConnState::Active;
            }
            Some(ReloadMessage::Hello { .. }) => self.state = ConnState::Active,
            Some(_) => {}
            None => crate::log!("reload"; "client {}: ignoring malformed message", self.id),
        }
    }

    pub(super) fn close(&mut self) {
        if self.is_open() {
            let _ = self.ws.close(None);
            let _ = self.ws.flush();
            self.state = ConnState::Closed;
        }
    }
}
