//! Network Module
//!
//! Client-facing server and connection handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per client connection, each owning its `Session`
//! - WebSocket handshake runs on the connection thread, never the acceptor
//! - Backend requests block only the connection that issued them

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
