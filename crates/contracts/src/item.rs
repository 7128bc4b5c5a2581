//! Item - the unit flowing through the hub
//!
//! An `Item` is either an Event (an opaque source line) or a Command
//! (`{"command": "flush"}`). Both travel on the same stream; only the
//! persistence side tells them apart.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable text payload broadcast by the hub
///
/// Cloning is cheap: the payload is shared between every client queue
/// and the store. The payload is classified once, on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    payload: Arc<str>,
    command: Option<Command>,
}

impl Item {
    /// Create an item from a raw payload
    pub fn new(payload: impl Into<Arc<str>>) -> Self {
        let payload = payload.into();
        let command = Command::parse(&payload);
        Self { payload, command }
    }

    /// Create an item carrying a serialized command
    pub fn command(command: Command) -> Self {
        Self {
            payload: command.to_payload().into(),
            command: Some(command),
        }
    }

    /// Raw payload text
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Interpret the payload as a command, if it has the command shape
    pub fn as_command(&self) -> Option<Command> {
        self.command
    }

    /// Whether the payload is a command (and must not be persisted)
    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Known command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandVerb {
    /// Day boundary: viewers clear their state, the daily store is truncated
    Flush,
}

impl CommandVerb {
    /// Wire name of the verb
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flush => "flush",
        }
    }
}

/// Control message sharing the event stream
///
/// Wire shape: `{"command": "<verb>"}`. Unknown extra fields are ignored
/// when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub command: CommandVerb,
}

impl Command {
    /// The daily flush command
    pub fn flush() -> Self {
        Self {
            command: CommandVerb::Flush,
        }
    }

    /// Parse a payload into a command
    ///
    /// Returns `None` for anything that is not a JSON object with a known
    /// `command` verb.
    pub fn parse(payload: &str) -> Option<Self> {
        // Plain event lines never reach the JSON parser
        if !payload.trim_start().starts_with('{') {
            return None;
        }
        match serde_json::from_str::<Value>(payload).ok()? {
            value @ Value::Object(_) => Self::deserialize(value).ok(),
            _ => None,
        }
    }

    /// Serialize to the wire shape
    pub fn to_payload(&self) -> String {
        format!(r#"{{"command":"{}"}}"#, self.command.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_payload_shape() {
        let item = Item::command(Command::flush());
        assert_eq!(item.payload(), r#"{"command":"flush"}"#);
        assert_eq!(item.as_command(), Some(Command::flush()));
    }

    #[test]
    fn test_command_with_whitespace_and_extra_fields() {
        assert!(Item::from(r#"{ "command" : "flush" }"#).is_command());
        assert!(Item::from(r#"{"command":"flush","at":"00:00"}"#).is_command());
    }

    #[test]
    fn test_events_are_not_commands() {
        assert!(!Item::from("E1").is_command());
        assert!(!Item::from(r#"{"command":"reboot"}"#).is_command());
        assert!(!Item::from(r#"{"src":"1.2.3.4","dst":"5.6.7.8"}"#).is_command());
        assert!(!Item::from(r#"["flush"]"#).is_command());
        assert!(!Item::from("").is_command());
    }

    #[test]
    fn test_only_objects_parse_as_commands() {
        assert_eq!(Command::parse(r#"["flush"]"#), None);
        assert_eq!(Command::parse(r#"  ["flush"]"#), None);
        assert_eq!(Command::parse(r#""flush""#), None);
        assert_eq!(Command::parse(r#"{"command":["flush"]}"#), None);
        assert_eq!(Command::parse(r#"{"command":"flush"} trailing"#), None);
        assert_eq!(Command::parse(r#"  {"command":"flush"}"#), Some(Command::flush()));
    }

    #[test]
    fn test_classification_is_cached() {
        let event = Item::from(r#"["flush"]"#);
        assert_eq!(event.as_command(), None);

        let command = Item::from(r#"{"command":"flush"}"#);
        assert_eq!(command, Item::command(Command::flush()));
    }

    #[test]
    fn test_item_clone_shares_payload() {
        let a = Item::from("payload".to_string());
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.to_string(), "payload");
        assert_eq!(b.len(), 7);
    }
}
