//! Command definitions
//!
//! A client command decoded from one JSON frame:
//! `{"command": "get" | "set", "key": <array of strings | object>}`.

use serde_json::Value;

use crate::error::TranslationError;

/// Command types understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Get,
    Set,
}

impl CommandType {
    /// Name as it appears in both the client JSON and the wire command
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Get => "get",
            CommandType::Set => "set",
        }
    }
}

/// A validated command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch one or more keys, order preserved
    Get { keys: Vec<String> },

    /// Store key/value pairs, in the order the client sent them
    Set { entries: Vec<(String, Value)> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
        }
    }

    /// Validate a decoded JSON value and extract the command it carries
    pub fn from_value(value: Value) -> Result<Self, TranslationError> {
        let Value::Object(mut root) = value else {
            return Err(TranslationError::Shape("frame is not a JSON object"));
        };

        let name = match root.get("command") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(TranslationError::Shape("`command` is not a string")),
            None => return Err(TranslationError::Shape("missing `command`")),
        };
        let key = root
            .remove("key")
            .ok_or(TranslationError::Shape("missing `key`"))?;

        match name.as_str() {
            "get" => {
                let Value::Array(items) = key else {
                    return Err(TranslationError::TypeMismatch("`get` requires an array of keys"));
                };
                let keys = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(k) => Ok(k),
                        _ => Err(TranslationError::TypeMismatch("`get` keys must be strings")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Command::Get { keys })
            }
            "set" => {
                let Value::Object(map) = key else {
                    return Err(TranslationError::TypeMismatch("`set` requires an object of entries"));
                };
                Ok(Command::Set {
                    entries: map.into_iter().collect(),
                })
            }
            _ => Err(TranslationError::UnsupportedCommand(name)),
        }
    }
}
