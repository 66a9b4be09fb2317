//! Backend client
//!
//! One request is one exchange on its own connection: write the wire
//! command, perform a single read, treat whatever arrived as the whole
//! reply, then close. Pooled connections are only ever pre-connected,
//! never reused.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use super::pool::{close, connect, ConnectionPool};
use crate::config::Config;
use crate::error::{BackendError, BackendStage, GatewayError, Result};
use crate::protocol::WireCommand;

/// Raw bytes returned by the backend for one command
pub type BackendReply = Bytes;

/// Something that answers wire commands
pub trait Backend: Send + Sync {
    /// Send one command and wait for its reply
    fn request(&self, wire: &WireCommand) -> std::result::Result<BackendReply, BackendError>;
}

/// TCP client for the line-oriented backend
pub struct BackendClient {
    /// Resolved backend address
    addr: SocketAddr,

    /// Bound on connect, send and receive
    timeout: Option<Duration>,

    /// Size of the single reply read
    max_reply_size: usize,

    /// Pre-connected, unused connections
    pool: ConnectionPool,
}

impl BackendClient {
    /// Create a client for the backend named in `config`.
    ///
    /// The address is resolved once, here.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = (config.backend_host.as_str(), config.backend_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                GatewayError::Config(format!(
                    "backend address {}:{} did not resolve",
                    config.backend_host, config.backend_port
                ))
            })?;

        Ok(Self {
            addr,
            timeout: config.backend_timeout(),
            max_reply_size: config.max_reply_size,
            pool: ConnectionPool::new(config.backend_pool_size, addr, config.backend_timeout()),
        })
    }

    /// Backend address this client talks to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Warm connections waiting in the pool
    pub fn idle_connections(&self) -> usize {
        self.pool.idle_count()
    }

    /// Write `wire` and perform the single reply read
    fn exchange(
        &self,
        stream: &mut TcpStream,
        wire: &WireCommand,
    ) -> std::result::Result<BackendReply, BackendError> {
        stream
            .write_all(wire.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(|e| BackendError::from_io(BackendStage::Send, e))?;

        let mut buf = vec![0u8; self.max_reply_size];
        let n = stream
            .read(&mut buf)
            .map_err(|e| BackendError::from_io(BackendStage::Receive, e))?;
        buf.truncate(n);

        Ok(Bytes::from(buf))
    }
}

impl Backend for BackendClient {
    fn request(&self, wire: &WireCommand) -> std::result::Result<BackendReply, BackendError> {
        let mut stream = match self.pool.checkout() {
            Some(stream) => stream,
            None => connect(self.addr, self.timeout)?,
        };

        // One exchange per connection, whatever the outcome
        let result = self.exchange(&mut stream, wire);
        close(stream);

        if let Ok(ref reply) = result {
            tracing::debug!("Backend replied with {} bytes", reply.len());
        }
        result
    }
}
