//! Backend Module
//!
//! Request/response access to the line-oriented key-value backend.
//!
//! ## Architecture
//! - [`Backend`] trait at the seam between sessions and the network
//! - [`BackendClient`]: one command, one read per exchange
//! - [`ConnectionPool`]: bounded set of pre-connected connections, each used
//!   for exactly one request; disabled with a pool size of 0

mod client;
mod pool;

pub use client::{Backend, BackendClient, BackendReply};
pub use pool::ConnectionPool;
