use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Command, MessageError};

/// Command name of a request.
pub const FIELD_COMMAND: &str = "c";
/// Reply payload of a response.
pub const FIELD_REPLY: &str = "r";
/// Error tag of a response that could not be handled.
pub const FIELD_ERROR: &str = "e";

/// Structured record exchanged between a hub and its tasks.
///
/// An ordered mapping of named fields. Three field names are reserved:
/// - `c`: command name (required on hub → task requests),
/// - `r`: reply payload,
/// - `e`: error tag.
///
/// A response carries exactly one of `r` / `e`. A message with none of the reserved fields
/// is a pure notification. Every other field is application data and is passed through
/// untouched, in insertion order.
///
/// On the wire a message is one line of JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create a request carrying only a command.
    pub fn request(command: impl AsRef<str>) -> Self {
        Self::new().with(FIELD_COMMAND, command.as_ref())
    }

    /// Builder-style field insertion.
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Raw command name, if `c` is present and a string.
    pub fn command_name(&self) -> Option<&str> {
        self.0.get(FIELD_COMMAND).and_then(Value::as_str)
    }

    /// Parsed command, if any.
    pub fn command(&self) -> Option<Command> {
        self.command_name().map(Command::parse)
    }

    pub fn reply(&self) -> Option<&Value> {
        self.0.get(FIELD_REPLY)
    }

    /// Error tag, if the message reports a failure.
    pub fn error(&self) -> Option<&str> {
        self.0.get(FIELD_ERROR).and_then(Value::as_str)
    }

    /// Returns `true` if the message answers an earlier request (`r` or `e` set).
    ///
    /// Responses are never dispatched as commands, even when they still carry `c`.
    pub fn is_response(&self) -> bool {
        self.0.contains_key(FIELD_REPLY) || self.0.contains_key(FIELD_ERROR)
    }

    /// Returns `true` if the message is a request (`c` set, not a response).
    pub fn is_request(&self) -> bool {
        self.0.contains_key(FIELD_COMMAND) && !self.is_response()
    }

    /// Returns `true` if the message carries none of the reserved fields.
    pub fn is_notification(&self) -> bool {
        !self.0.contains_key(FIELD_COMMAND) && !self.is_response()
    }

    /// Turn this message into a successful response carrying `value` as `r`.
    pub fn into_reply(mut self, value: impl Into<Value>) -> Self {
        self.0.shift_remove(FIELD_ERROR);
        self.0.insert(FIELD_REPLY.to_string(), value.into());
        self
    }

    /// Turn this message into a failed response tagged with `tag` as `e`.
    pub fn into_error(mut self, tag: impl Into<String>) -> Self {
        self.0.shift_remove(FIELD_REPLY);
        self.0.insert(FIELD_ERROR.to_string(), Value::String(tag.into()));
        self
    }

    /// Copy every field of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: Message) {
        for (k, v) in other.0 {
            self.0.insert(k, v);
        }
    }

    /// Encode as a single line of JSON (without the trailing newline).
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(&self.0).map_err(|e| MessageError::Encode(e.to_string()))
    }

    /// Decode one JSON line. The top-level value must be an object.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| MessageError::Decode(e.to_string()))?;
        Self::try_from(value)
    }
}

impl From<Map<String, Value>> for Message {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Message> for Value {
    fn from(msg: Message) -> Self {
        Value::Object(msg.0)
    }
}

impl TryFrom<Value> for Message {
    type Error = MessageError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(MessageError::NotAnObject("null")),
            Value::Bool(_) => Err(MessageError::NotAnObject("bool")),
            Value::Number(_) => Err(MessageError::NotAnObject("number")),
            Value::String(_) => Err(MessageError::NotAnObject("string")),
            Value::Array(_) => Err(MessageError::NotAnObject("array")),
        }
    }
}
