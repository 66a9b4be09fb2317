//! Session Module
//!
//! Per-connection controller that drives one chunk of client input through
//! the pipeline:
//!
//! ```text
//! chunk → FrameAccumulator ─ Incomplete ─→ Await
//!                          ─ Decoded ────→ translate → Backend::request → Reply
//! ```
//!
//! Any error is terminal: the caller closes the connection. The buffer is
//! emptied after every reply and on every error, so nothing carries over
//! from one command to the next.
//!
//! A session processes one chunk at a time through `&mut self`, so it can
//! never have two backend requests outstanding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{Backend, BackendReply};
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{translate, FrameAccumulator, FrameStatus};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// What the connection should do after a chunk
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Frame incomplete; read more bytes
    Await,

    /// Relay this reply to the client as one message
    Reply(BackendReply),
}

/// Accumulation and processing state for one client connection
pub struct Session {
    id: u64,
    frames: FrameAccumulator,
    backend: Arc<dyn Backend>,
    max_command_size: usize,
}

impl Session {
    /// Create a session with a fresh id and an empty buffer
    pub fn new(config: &Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            frames: FrameAccumulator::new(config.max_frame_size),
            backend,
            max_command_size: config.max_command_size,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bytes waiting for the rest of their frame
    pub fn buffered_len(&self) -> usize {
        self.frames.len()
    }

    /// Feed one inbound chunk
    pub fn on_data(&mut self, chunk: &[u8]) -> Result<Step> {
        let result = self.process(chunk);
        if !matches!(result, Ok(Step::Await)) {
            self.frames.clear();
        }
        result
    }

    fn process(&mut self, chunk: &[u8]) -> Result<Step> {
        let value = match self.frames.append(chunk)? {
            FrameStatus::Incomplete => {
                tracing::trace!(session = self.id, buffered = self.frames.len(), "Frame incomplete");
                return Ok(Step::Await);
            }
            FrameStatus::Decoded(value) => value,
        };
        tracing::debug!(session = self.id, "Decoded frame: {}", value);

        let wire = translate(value, self.max_command_size)?;
        tracing::debug!(session = self.id, "Sending to backend: {}", wire);

        let reply = self.backend.request(&wire)?;
        tracing::trace!(
            session = self.id,
            "Received from backend: {}",
            String::from_utf8_lossy(&reply)
        );

        Ok(Step::Reply(reply))
    }
}
