//! Configuration for kvgate
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{GatewayError, Result};

/// Framing used on client connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Raw TCP byte stream; each read is one chunk
    Tcp,

    /// WebSocket; each text or binary message is one chunk and each reply is
    /// sent as one message
    #[default]
    WebSocket,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => f.write_str("tcp"),
            Transport::WebSocket => f.write_str("websocket"),
        }
    }
}

/// Main configuration for a kvgate instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Client-facing Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address for clients
    pub listen_addr: String,

    /// Client framing
    pub transport: Transport,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Client idle timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Client write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Per-session buffer capacity: the largest JSON frame a client may send
    pub max_frame_size: usize,

    // -------------------------------------------------------------------------
    // Backend Configuration
    // -------------------------------------------------------------------------
    /// Backend host name or IP
    pub backend_host: String,

    /// Backend TCP port
    pub backend_port: u16,

    /// Longest wire command the backend accepts (bytes)
    pub max_command_size: usize,

    /// Size of the single read that receives a backend reply (bytes)
    pub max_reply_size: usize,

    /// Bound on backend connect, send and receive (milliseconds, 0 disables)
    pub backend_timeout_ms: u64,

    /// Idle backend connections kept for reuse (0 = connection per request)
    pub backend_pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8880".to_string(),
            transport: Transport::WebSocket,
            max_connections: 1024,
            read_timeout_ms: 300_000,
            write_timeout_ms: 5000,
            max_frame_size: 4096,
            backend_host: "127.0.0.1".to_string(),
            backend_port: 8080,
            max_command_size: 4096,
            max_reply_size: 4096,
            backend_timeout_ms: 5000,
            backend_pool_size: 8,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size == 0 {
            return Err(GatewayError::Config("max_frame_size must be non-zero".into()));
        }
        if self.max_command_size == 0 {
            return Err(GatewayError::Config("max_command_size must be non-zero".into()));
        }
        if self.max_reply_size == 0 {
            return Err(GatewayError::Config("max_reply_size must be non-zero".into()));
        }
        if self.max_connections == 0 {
            return Err(GatewayError::Config("max_connections must be non-zero".into()));
        }
        if self.backend_host.trim().is_empty() {
            return Err(GatewayError::Config("backend_host must not be empty".into()));
        }
        Ok(())
    }

    /// Backend timeout, `None` when disabled
    pub fn backend_timeout(&self) -> Option<Duration> {
        millis(self.backend_timeout_ms)
    }

    /// Client read timeout, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    /// Client write timeout, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the client framing
    pub fn transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the client read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the client write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the per-session frame capacity (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the backend host
    pub fn backend_host(mut self, host: impl Into<String>) -> Self {
        self.config.backend_host = host.into();
        self
    }

    /// Set the backend port
    pub fn backend_port(mut self, port: u16) -> Self {
        self.config.backend_port = port;
        self
    }

    /// Set the backend line limit (in bytes)
    pub fn max_command_size(mut self, size: usize) -> Self {
        self.config.max_command_size = size;
        self
    }

    /// Set the backend reply read size (in bytes)
    pub fn max_reply_size(mut self, size: usize) -> Self {
        self.config.max_reply_size = size;
        self
    }

    /// Set the backend timeout (in milliseconds)
    pub fn backend_timeout_ms(mut self, ms: u64) -> Self {
        self.config.backend_timeout_ms = ms;
        self
    }

    /// Set how many idle backend connections are kept
    pub fn backend_pool_size(mut self, size: usize) -> Self {
        self.config.backend_pool_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
