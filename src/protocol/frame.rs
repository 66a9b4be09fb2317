//! Frame accumulator
//!
//! Buffers client bytes until they hold one complete JSON value.

use bytes::BytesMut;
use serde_json::{Deserializer, Value};

use crate::error::FrameError;

/// Result of feeding a chunk to the accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    /// The buffer ends mid-value; wait for more bytes
    Incomplete,

    /// A complete value was decoded from the front of the buffer
    Decoded(Value),
}

/// Per-connection append-only buffer with a fixed capacity.
///
/// The accumulator never clears itself. After a `Decoded` status the owner
/// calls [`FrameAccumulator::clear`], which also discards any bytes that
/// followed the decoded value.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: BytesMut,
    max_frame_size: usize,
}

impl FrameAccumulator {
    /// Create an empty accumulator that holds at most `max_frame_size` bytes
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_frame_size),
            max_frame_size,
        }
    }

    /// Append `chunk` and try to decode one JSON value.
    ///
    /// Fails with `CapacityExceeded` before copying anything if the chunk
    /// would push the buffer past its capacity.
    pub fn append(&mut self, chunk: &[u8]) -> Result<FrameStatus, FrameError> {
        let len = self.buffer.len() + chunk.len();
        if len > self.max_frame_size {
            return Err(FrameError::CapacityExceeded {
                len,
                max: self.max_frame_size,
            });
        }
        self.buffer.extend_from_slice(chunk);

        self.try_decode()
    }

    fn try_decode(&self) -> Result<FrameStatus, FrameError> {
        // Only containers have an unambiguous end; a bare `1` could be the
        // start of `123`
        match self.buffer.iter().find(|b| !b.is_ascii_whitespace()) {
            None => return Ok(FrameStatus::Incomplete),
            Some(b'{' | b'[') => {}
            Some(_) => {
                return Err(FrameError::Malformed {
                    reason: "top-level value must be an object or array".to_string(),
                })
            }
        }

        // A stream deserializer stops after the first value, leaving any
        // trailing bytes unread.
        let mut values = Deserializer::from_slice(&self.buffer).into_iter::<Value>();
        match values.next() {
            None => Ok(FrameStatus::Incomplete),
            Some(Ok(value)) => Ok(FrameStatus::Decoded(value)),
            // The parser ran off the end of the buffer: more bytes may complete it
            Some(Err(e)) if e.is_eof() => Ok(FrameStatus::Incomplete),
            Some(Err(e)) => Err(FrameError::Malformed {
                reason: e.to_string(),
            }),
        }
    }

    /// Reset to empty, keeping the allocation
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_frame_size
    }
}
