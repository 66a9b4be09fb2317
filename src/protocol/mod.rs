//! Protocol Module
//!
//! Client framing and translation into the backend line protocol.
//!
//! ## Client Format
//! One UTF-8 JSON object per command, no length prefix or delimiter: the
//! end of the JSON value is the end of the frame.
//! ```text
//! {"command": "get", "key": ["a", "b"]}
//! {"command": "set", "key": {"a": "x", "b": true}}
//! ```
//!
//! ## Backend Format
//! ```text
//! get ['a', 'b']
//! set {'a': 'x', 'b': True}
//! ```
//!
//! ## Pipeline
//! bytes → [`FrameAccumulator`] → JSON value → [`translate`] → [`WireCommand`]

mod command;
mod frame;
mod translate;

pub use command::{Command, CommandType};
pub use frame::{FrameAccumulator, FrameStatus};
pub use translate::{render, translate, WireCommand};
