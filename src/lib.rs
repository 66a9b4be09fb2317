//! # kvgate
//!
//! A protocol gateway between JSON clients and a line-oriented key-value
//! backend:
//! - Incremental framing of JSON commands over a persistent WebSocket (or raw
//!   TCP) connection
//! - Translation into the backend's `get [...]` / `set {...}` line format
//! - Bounded, timed backend requests over pre-connected backend connections
//! - One thread per client connection, strict in-order processing per client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Server (WebSocket / TCP)                     │
//! │               (one thread per client)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ messages / raw chunks
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Session                                 │
//! │        FrameAccumulator → translate → Backend                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ wire command
//!                       ▼
//!               ┌───────────────┐        ┌─────────────┐
//!               │ BackendClient │◄──────►│ConnectionPool│
//!               └───────┬───────┘        └─────────────┘
//!                       │
//!                       ▼
//!                ( backend service )
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod backend;
pub mod session;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BackendError, FrameError, GatewayError, Result, TranslationError};
pub use config::{Config, Transport};
pub use backend::{Backend, BackendClient, BackendReply};
pub use session::{Session, Step};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvgate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
