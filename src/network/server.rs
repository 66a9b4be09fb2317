//! Client Server
//!
//! Accepts client connections and runs each on its own thread.

use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::Connection;
use crate::backend::Backend;
use crate::config::Config;
use crate::error::{GatewayError, Result};

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A connection thread and a handle on its client socket
struct Worker {
    thread: JoinHandle<()>,
    socket: TcpStream,
}

/// Client-facing server for kvgate
pub struct Server {
    config: Config,
    backend: Arc<dyn Backend>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    workers: Mutex<Vec<Worker>>,
}

impl Server {
    /// Validate `config` and bind the listen address
    pub fn bind(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            backend,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {} ({})", self.local_addr()?, self.config.transport);

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    self.reap_workers();
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Shutting down, closing {} connection(s)", self.active_connections());
        let workers = std::mem::take(&mut *self.workers.lock());
        // Wakes threads blocked reading from idle clients
        for worker in &workers {
            let _ = worker.socket.shutdown(Shutdown::Both);
        }
        for worker in workers {
            let _ = worker.thread.join();
        }
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Flag that stops the accept loop when set, for use from other threads
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
            tracing::warn!(
                "Refusing connection from {}: {} connections already open",
                peer,
                self.config.max_connections
            );
            return;
        }

        // Accepted sockets may inherit non-blocking mode on some platforms
        let setup = stream
            .set_nonblocking(false)
            .and_then(|()| stream.try_clone())
            .map_err(GatewayError::from)
            .and_then(|socket| {
                let connection = Connection::new(stream, &self.config, Arc::clone(&self.backend))?;
                Ok((connection, socket))
            });
        let (mut connection, socket) = match setup {
            Ok(setup) => setup,
            Err(e) => {
                tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                return;
            }
        };

        self.active.fetch_add(1, Ordering::Relaxed);
        let active = Arc::clone(&self.active);
        let spawned = thread::Builder::new()
            .name(format!("kvgate-conn-{}", connection.session_id()))
            .spawn(move || {
                // Errors are logged by the connection itself
                let _ = connection.handle();
                active.fetch_sub(1, Ordering::Relaxed);
            });

        match spawned {
            Ok(thread) => self.workers.lock().push(Worker { thread, socket }),
            Err(e) => {
                self.active.fetch_sub(1, Ordering::Relaxed);
                tracing::error!("Failed to spawn connection thread for {}: {}", peer, e);
            }
        }
    }

    /// Drop handles of finished connection threads
    fn reap_workers(&self) {
        self.workers.lock().retain(|worker| !worker.thread.is_finished());
    }
}
