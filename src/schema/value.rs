//! Runtime values carried by encoded messages.

use std::collections::hash_map;
use std::collections::HashMap;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// INT32 primitive.
    Int32(i32),
    /// STRING primitive.
    String(String),
    /// Nested message.
    Message(Message),
}

impl Value {
    /// Name of the value kind, matching [`FieldType::type_name`](super::FieldType::type_name).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::String(_) => "string",
            Value::Message(_) => "message",
        }
    }

    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

/// Decoded (or to-be-encoded) message: field name to value.
///
/// Field order is irrelevant here; the schema decides encode order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: HashMap<String, Value>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_int32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_int32)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_message(&self, name: &str) -> Option<&Message> {
        self.get(name).and_then(Value::as_message)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
