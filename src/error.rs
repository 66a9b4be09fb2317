//! Error types for kvgate
//!
//! Each pipeline stage has its own error enum; `GatewayError` unifies them
//! for the session and network layers.

use std::fmt;

use thiserror::Error;

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type for kvgate operations
#[derive(Debug, Error)]
pub enum GatewayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Short label for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Io(_) => "io",
            GatewayError::WebSocket(_) => "websocket",
            GatewayError::Frame(FrameError::Malformed { .. }) => "malformed_frame",
            GatewayError::Frame(FrameError::CapacityExceeded { .. }) => "capacity_exceeded",
            GatewayError::Translation(_) => "translation",
            GatewayError::Backend(_) => "backend",
            GatewayError::Config(_) => "config",
        }
    }
}

/// Failures while accumulating client bytes into a frame.
///
/// Waiting for more input is not an error; see `FrameStatus::Incomplete`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {reason}")]
    Malformed { reason: String },

    #[error("capacity exceeded: {len} bytes buffered, limit is {max}")]
    CapacityExceeded { len: usize, max: usize },
}

/// Failures while mapping a decoded value onto a backend command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// Not an object, `command` missing or not a string, or `key` missing
    #[error("invalid command shape: {0}")]
    Shape(&'static str),

    /// `key` (or one of its elements) has the wrong JSON type for the command
    #[error("type mismatch: {0}")]
    TypeMismatch(&'static str),

    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("wire command is {len} bytes, backend limit is {max}")]
    TooLarge { len: usize, max: usize },
}

/// Stage of a backend exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStage {
    Connect,
    Send,
    Receive,
}

impl fmt::Display for BackendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStage::Connect => f.write_str("connect"),
            BackendStage::Send => f.write_str("send"),
            BackendStage::Receive => f.write_str("receive"),
        }
    }
}

/// Failures talking to the backend service
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    #[error("backend {0} timed out")]
    Timeout(BackendStage),
}

impl BackendError {
    /// Classify an I/O error raised during `stage`
    pub(crate) fn from_io(stage: BackendStage, err: std::io::Error) -> Self {
        match err.kind() {
            // Socket timeouts surface as WouldBlock on Unix, TimedOut on Windows
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                BackendError::Timeout(stage)
            }
            _ => match stage {
                BackendStage::Connect => BackendError::ConnectFailed(err),
                BackendStage::Send => BackendError::SendFailed(err),
                BackendStage::Receive => BackendError::ReceiveFailed(err),
            },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}
