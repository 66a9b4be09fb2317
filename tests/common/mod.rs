//! Shared test helpers: in-process fake backends on ephemeral ports.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use kvgate::Config;

/// A backend that records each command it receives and answers with a
/// fixed reply
pub struct FakeBackend {
    pub addr: SocketAddr,
    pub received: Receiver<String>,
    accepts: Arc<AtomicUsize>,
}

impl FakeBackend {
    /// Answer every command with `reply`. With `keep_alive` the connection
    /// stays open for further commands; otherwise it is closed after one.
    pub fn spawn(reply: &'static [u8], keep_alive: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = unbounded();
        let accepts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepts);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let tx = tx.clone();
                thread::spawn(move || serve(stream, tx, reply, keep_alive));
            }
        });

        Self {
            addr,
            received: rx,
            accepts,
        }
    }

    /// Connections accepted so far
    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    /// Next command the backend received
    pub fn next_command(&self) -> String {
        self.received
            .recv_timeout(Duration::from_secs(5))
            .expect("backend received no command")
    }

    /// Gateway config pointing at this backend
    pub fn config(&self) -> kvgate::config::ConfigBuilder {
        Config::builder()
            .backend_host(self.addr.ip().to_string())
            .backend_port(self.addr.port())
            .backend_timeout_ms(2000)
    }
}

fn serve(mut stream: TcpStream, tx: Sender<String>, reply: &[u8], keep_alive: bool) {
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
        if stream.write_all(reply).is_err() || !keep_alive {
            return;
        }
    }
}

/// A backend that accepts and reads but never answers
pub fn spawn_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
            });
        }
    });

    addr
}

/// An address nothing listens on
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A keep-alive backend that numbers its replies and writes each one in two
/// segments, `REPLY-n-PART1|` then `REPLY-n-PART2` after a short pause
pub fn spawn_split_reply_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                while matches!(stream.read(&mut buf), Ok(n) if n > 0) {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if stream.write_all(format!("REPLY-{n}-PART1|").as_bytes()).is_err() {
                        return;
                    }
                    thread::sleep(Duration::from_millis(50));
                    if stream.write_all(format!("REPLY-{n}-PART2").as_bytes()).is_err() {
                        return;
                    }
                }
            });
        }
    });

    addr
}

/// A backend that drops any connection left idle for `idle` and answers
/// `OK` on the others
pub fn spawn_idle_closing_backend(idle: Duration) -> FakeBackend {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = unbounded();
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepts);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            let tx: Sender<String> = tx.clone();
            thread::spawn(move || {
                stream.set_read_timeout(Some(idle)).unwrap();
                let mut buf = [0u8; 4096];
                if let Ok(n) = stream.read(&mut buf) {
                    if n > 0 {
                        let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
                        let _ = stream.write_all(b"OK");
                    }
                }
            });
        }
    });

    FakeBackend {
        addr,
        received: rx,
        accepts,
    }
}

/// Poll `condition` for up to five seconds
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
