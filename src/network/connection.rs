//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use tungstenite::error::ProtocolError;
use tungstenite::handshake::HandshakeError;
use tungstenite::{Message, WebSocket};

use crate::backend::Backend;
use crate::config::{Config, Transport};
use crate::error::Result;
use crate::session::{Session, Step};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream to the client
    stream: TcpStream,

    /// Framing and translation state for this client
    session: Session,

    /// Client framing
    transport: Transport,

    /// Size of each socket read
    read_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Configures timeouts from `config` and starts an empty session
    pub fn new(stream: TcpStream, config: &Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        Ok(Self {
            stream,
            session: Session::new(config, backend),
            transport: config.transport,
            read_size: config.max_frame_size,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Feeds every chunk to the session and relays replies. Returns when the
    /// client disconnects or the session fails; the socket is closed either way.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(session = self.session.id(), "Connection established from {}", self.peer_addr);

        let result = match self.transport {
            Transport::Tcp => self.serve_tcp(),
            Transport::WebSocket => self.serve_websocket(),
        };
        self.close();

        if let Err(ref e) = result {
            tracing::warn!(
                session = self.session.id(),
                kind = e.kind(),
                "Closing connection from {}: {}",
                self.peer_addr,
                e
            );
        }
        result
    }

    fn serve_tcp(&mut self) -> Result<()> {
        let mut buf = vec![0u8; self.read_size];

        loop {
            let n = match self.stream.read(&mut buf) {
                Ok(0) => {
                    tracing::debug!(session = self.session.id(), "Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(n) => n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) if is_disconnect(e.kind()) => {
                    tracing::debug!(session = self.session.id(), "Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    tracing::debug!(session = self.session.id(), "Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if let Step::Reply(reply) = self.session.on_data(&buf[..n])? {
                let sent = self
                    .stream
                    .write_all(&reply)
                    .and_then(|()| self.stream.flush());
                if let Err(e) = sent {
                    if is_disconnect(e.kind()) {
                        self.log_early_disconnect();
                        return Ok(());
                    }
                    return Err(e.into());
                }
            }
        }
    }

    fn serve_websocket(&mut self) -> Result<()> {
        let mut ws = match tungstenite::accept(self.stream.try_clone()?) {
            Ok(ws) => ws,
            Err(HandshakeError::Failure(e)) => return Err(e.into()),
            // A blocking socket only stalls when the read timeout fires
            Err(HandshakeError::Interrupted(_)) => {
                tracing::debug!(session = self.session.id(), "Handshake timeout for client {}", self.peer_addr);
                return Ok(());
            }
        };

        let result = self.pump_messages(&mut ws);
        if result.is_ok() {
            // Best effort: the peer may already be gone
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        result
    }

    fn pump_messages(&mut self, ws: &mut WebSocket<TcpStream>) -> Result<()> {
        loop {
            let chunk = match ws.read() {
                Ok(Message::Text(text)) => text.into_bytes(),
                Ok(Message::Binary(data)) => data,
                // Pings are answered by tungstenite on the next read or write
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Ok(Message::Close(_)) => {
                    tracing::debug!(session = self.session.id(), "Client {} sent close", self.peer_addr);
                    return Ok(());
                }
                Err(ref e) if is_websocket_disconnect(e) => {
                    tracing::debug!(session = self.session.id(), "Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(tungstenite::Error::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!(session = self.session.id(), "Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if let Step::Reply(reply) = self.session.on_data(&chunk)? {
                // One reply, one message; text unless the backend sent non-UTF-8
                let message = match String::from_utf8(reply.to_vec()) {
                    Ok(text) => Message::Text(text),
                    Err(e) => Message::Binary(e.into_bytes()),
                };
                if let Err(e) = ws.send(message) {
                    if is_websocket_disconnect(&e) {
                        self.log_early_disconnect();
                        return Ok(());
                    }
                    return Err(e.into());
                }
            }
        }
    }

    fn log_early_disconnect(&self) {
        tracing::debug!(
            session = self.session.id(),
            "Client {} disconnected before reply could be sent",
            self.peer_addr
        );
    }

    fn close(&mut self) {
        // Already closed by the peer in the common case
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Id of the session served by this connection
    pub fn session_id(&self) -> u64 {
        self.session.id()
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}

fn is_websocket_disconnect(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(e) => is_disconnect(e.kind()),
        _ => false,
    }
}
