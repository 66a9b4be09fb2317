//! Warm connection pool
//!
//! Holds backend connections that were opened ahead of time and have never
//! carried a request. A stream leaves the pool once and is closed after its
//! single exchange, so no reply bytes can ever reach another request.
//!
//! A refill thread tops the pool back up whenever a stream is taken.

use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use crossbeam::queue::ArrayQueue;

use crate::error::{BackendError, BackendStage};

/// Bounded set of pre-connected, unused backend connections
pub struct ConnectionPool {
    /// `None` when pooling is disabled (ArrayQueue cannot be zero-sized)
    idle: Option<Arc<ArrayQueue<TcpStream>>>,

    /// Wakes the refill thread; dropping it stops the thread
    refill: Option<Sender<()>>,
}

impl ConnectionPool {
    /// Create a pool that keeps up to `size` warm connections to `addr`.
    ///
    /// With a non-zero size this starts the refill thread and asks it for
    /// an initial fill.
    pub fn new(size: usize, addr: SocketAddr, timeout: Option<Duration>) -> Self {
        if size == 0 {
            return Self {
                idle: None,
                refill: None,
            };
        }

        let idle = Arc::new(ArrayQueue::new(size));
        // One pending wake-up is enough; extra requests coalesce
        let (tx, rx) = bounded(1);
        let queue = Arc::clone(&idle);
        let spawned = thread::Builder::new()
            .name("kvgate-pool-refill".to_string())
            .spawn(move || refill_loop(&queue, &rx, addr, timeout));

        let refill = match spawned {
            Ok(_) => Some(tx),
            Err(e) => {
                tracing::warn!("Failed to start pool refill thread, pooling disabled: {}", e);
                None
            }
        };

        let pool = Self {
            idle: refill.as_ref().map(|_| idle),
            refill,
        };
        pool.request_refill();
        pool
    }

    pub fn is_enabled(&self) -> bool {
        self.idle.is_some()
    }

    /// Take a warm connection that is still open and has nothing pending.
    ///
    /// Connections the backend closed (or wrote to) while they sat idle are
    /// discarded. Each checkout asks the refill thread for a replacement.
    pub fn checkout(&self) -> Option<TcpStream> {
        let idle = self.idle.as_ref()?;
        self.request_refill();

        while let Some(stream) = idle.pop() {
            if is_untouched(&stream) {
                return Some(stream);
            }
            tracing::debug!("Discarding stale warm backend connection");
            close(stream);
        }
        None
    }

    /// Number of warm connections
    pub fn idle_count(&self) -> usize {
        self.idle.as_ref().map_or(0, |idle| idle.len())
    }

    fn request_refill(&self) {
        if let Some(tx) = &self.refill {
            match tx.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => {
                    tracing::warn!("Pool refill thread has stopped");
                }
            }
        }
    }
}

fn refill_loop(
    idle: &ArrayQueue<TcpStream>,
    wake: &Receiver<()>,
    addr: SocketAddr,
    timeout: Option<Duration>,
) {
    while wake.recv().is_ok() {
        while idle.len() < idle.capacity() {
            match connect(addr, timeout) {
                Ok(stream) => {
                    if let Err(stream) = idle.push(stream) {
                        close(stream);
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not pre-connect to backend {}: {}", addr, e);
                    break;
                }
            }
        }
    }
}

/// True if the peer has neither closed the stream nor sent anything on it
fn is_untouched(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut byte = [0u8; 1];
    let untouched = matches!(stream.peek(&mut byte), Err(ref e) if e.kind() == ErrorKind::WouldBlock);
    untouched && stream.set_nonblocking(false).is_ok()
}

/// Open a connection with nodelay and `timeout` applied to reads and writes
pub(crate) fn connect(
    addr: SocketAddr,
    timeout: Option<Duration>,
) -> Result<TcpStream, BackendError> {
    let stream = match timeout {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
        None => TcpStream::connect(addr),
    }
    .map_err(|e| BackendError::from_io(BackendStage::Connect, e))?;

    stream
        .set_nodelay(true)
        .and_then(|()| stream.set_read_timeout(timeout))
        .and_then(|()| stream.set_write_timeout(timeout))
        .map_err(BackendError::ConnectFailed)?;

    Ok(stream)
}

/// Shut a stream down and drop it
pub(crate) fn close(stream: TcpStream) {
    // The peer may already be gone
    let _ = stream.shutdown(Shutdown::Both);
}
