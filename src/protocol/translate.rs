//! Command translation
//!
//! Renders a validated [`Command`] into the backend's line format.
//!
//! ## Wire Format
//! ```text
//! get ['k1', 'k2']
//! set {'k1': 'v1', 'k2': True, 'k3': 42, 'k4': null, 'k5': {"a":[1,2]}}
//! ```
//!
//! Strings are single-quoted without escaping. A key or value containing a
//! quote will produce a line the backend may misread, so untrusted content
//! must be vetted before it reaches the gateway.

use std::fmt::{self, Write as _};

use serde_json::Value;

use super::Command;
use crate::error::TranslationError;

/// One backend request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCommand(String);

impl WireCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WireCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate `value` and render it as a wire command no longer than
/// `max_command_size` bytes
pub fn translate(value: Value, max_command_size: usize) -> Result<WireCommand, TranslationError> {
    let command = Command::from_value(value)?;
    let wire = render(&command);

    if wire.len() > max_command_size {
        return Err(TranslationError::TooLarge {
            len: wire.len(),
            max: max_command_size,
        });
    }
    Ok(wire)
}

/// Render a command without any size check
pub fn render(command: &Command) -> WireCommand {
    let mut line = String::from(command.command_type().as_str());

    match command {
        Command::Get { keys } => {
            line.push_str(" [");
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                push_quoted(&mut line, key);
            }
            line.push(']');
        }
        Command::Set { entries } => {
            line.push_str(" {");
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                push_quoted(&mut line, key);
                line.push_str(": ");
                push_value(&mut line, value);
            }
            line.push('}');
        }
    }

    WireCommand(line)
}

fn push_quoted(line: &mut String, s: &str) {
    line.push('\'');
    line.push_str(s);
    line.push('\'');
}

fn push_value(line: &mut String, value: &Value) {
    match value {
        Value::String(s) => push_quoted(line, s),
        Value::Bool(true) => line.push_str("True"),
        Value::Bool(false) => line.push_str("False"),
        // Numbers, null and nested containers go out as compact JSON
        other => {
            // Writing into a String cannot fail
            let _ = write!(line, "{other}");
        }
    }
}
