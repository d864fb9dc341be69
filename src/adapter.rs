//! Adapting caller types to and from schema messages.
//!
//! [`SchemaProvider`] is the seam between typed caller values and the
//! field-name/value [`Message`]s the codec works on. Implement it by hand, or
//! let [`to_message`] / [`from_message`] bridge any serde type through
//! `serde_json::Value`.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//!
//! use grpcweb_client::adapter::{self, SchemaProvider};
//! use grpcweb_client::schema::{Message, MessageType, PrimitiveType};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Greeting {
//!     id: i32,
//!     text: String,
//! }
//!
//! impl SchemaProvider for Greeting {
//!     fn message_type() -> Arc<MessageType> {
//!         static SCHEMA: OnceLock<Arc<MessageType>> = OnceLock::new();
//!         SCHEMA
//!             .get_or_init(|| {
//!                 Arc::new(
//!                     MessageType::builder()
//!                         .field(1, "id", PrimitiveType::Int32)
//!                         .field(2, "text", PrimitiveType::String)
//!                         .build()
//!                         .expect("static schema"),
//!                 )
//!             })
//!             .clone()
//!     }
//!
//!     fn to_message(&self) -> grpcweb_client::Result<Message> {
//!         adapter::to_message(&Self::message_type(), self)
//!     }
//!
//!     fn from_message(message: Message) -> grpcweb_client::Result<Self> {
//!         adapter::from_message(message)
//!     }
//! }
//!
//! let greeting = Greeting { id: 1, text: "hi".into() };
//! let message = greeting.to_message().unwrap();
//! assert_eq!(message.get_str("text"), Some("hi"));
//! assert_eq!(Greeting::from_message(message).unwrap(), greeting);
//! ```

use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{GrpcWebError, Result};
use crate::schema::{FieldType, Message, MessageType, PrimitiveType, Value};

/// Supplies a schema for a caller type and converts values across it.
pub trait SchemaProvider: Sized {
    /// Descriptor for this type. Should return the same shared instance each time.
    fn message_type() -> Arc<MessageType>;

    /// Convert to a message ready for encoding.
    fn to_message(&self) -> Result<Message>;

    /// Build from a decoded message.
    fn from_message(message: Message) -> Result<Self>;
}

/// Convert any `Serialize` value into a [`Message`] shaped by `schema`.
///
/// Keys the schema does not declare are dropped; `null` and absent keys leave
/// the field unset so the encoder applies required/optional rules.
///
/// # Errors
///
/// `SchemaAdaptation` if the value is not an object or a field has the wrong
/// JSON kind (including integers outside the `i32` range).
pub fn to_message<T: Serialize + ?Sized>(schema: &MessageType, value: &T) -> Result<Message> {
    json_to_message(schema, serde_json::to_value(value)?)
}

/// Convert a decoded [`Message`] into any `DeserializeOwned` type.
pub fn from_message<T: DeserializeOwned>(message: Message) -> Result<T> {
    Ok(serde_json::from_value(message_to_json(message))?)
}

fn json_to_message(schema: &MessageType, json: JsonValue) -> Result<Message> {
    let mut object = match json {
        JsonValue::Object(object) => object,
        other => {
            return Err(adaptation_error(format!(
                "expected an object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut message = Message::new();
    for field in schema.fields() {
        match object.remove(field.name()) {
            None | Some(JsonValue::Null) => continue,
            Some(json) => {
                let value = json_to_value(field.name(), field.field_type(), json)?;
                message.insert(field.name(), value);
            }
        }
    }

    Ok(message)
}

fn json_to_value(name: &str, ty: &FieldType, json: JsonValue) -> Result<Value> {
    match (ty, json) {
        (FieldType::Primitive(PrimitiveType::Int32), JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int32)
            .ok_or_else(|| adaptation_error(format!("field {:?}: {} is not an int32", name, n))),
        (FieldType::Primitive(PrimitiveType::String), JsonValue::String(s)) => Ok(Value::String(s)),
        (FieldType::Message(schema), json @ JsonValue::Object(_)) => {
            json_to_message(schema, json).map(Value::Message)
        }
        (FieldType::Optional(opt), json) => json_to_value(name, opt.base(), json),
        (ty, json) => Err(adaptation_error(format!(
            "field {:?}: expected {}, got {}",
            name,
            ty.type_name(),
            json_kind(&json)
        ))),
    }
}

fn message_to_json(message: Message) -> JsonValue {
    JsonValue::Object(
        message
            .into_iter()
            .map(|(name, value)| (name, value_to_json(value)))
            .collect(),
    )
}

fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Int32(v) => JsonValue::from(v),
        Value::String(s) => JsonValue::String(s),
        Value::Message(m) => message_to_json(m),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn adaptation_error(msg: impl Display) -> GrpcWebError {
    GrpcWebError::SchemaAdaptation(<serde_json::Error as serde::de::Error>::custom(msg))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Shape {
        name: String,
        origin: Point,
        #[serde(default)]
        sides: i32,
        note: Option<String>,
    }

    fn point_schema() -> Arc<MessageType> {
        Arc::new(
            MessageType::builder()
                .field(1, "x", PrimitiveType::Int32)
                .field(2, "y", PrimitiveType::Int32)
                .build()
                .unwrap(),
        )
    }

    fn shape_schema() -> MessageType {
        MessageType::builder()
            .field(1, "name", PrimitiveType::String)
            .message(2, "origin", point_schema())
            .optional(3, "sides", PrimitiveType::Int32, 0)
            .optional(4, "note", PrimitiveType::String, "")
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_message_nested() {
        let shape = Shape {
            name: "tri".into(),
            origin: Point { x: 1, y: -2 },
            sides: 3,
            note: None,
        };

        let message = to_message(&shape_schema(), &shape).unwrap();

        assert_eq!(message.get_str("name"), Some("tri"));
        assert_eq!(message.get_message("origin").unwrap().get_int32("y"), Some(-2));
        assert_eq!(message.get_int32("sides"), Some(3));
        assert!(!message.contains("note"));
    }

    #[test]
    fn test_from_message_nested() {
        let message = Message::new()
            .with("name", "sq")
            .with("origin", Message::new().with("x", 0).with("y", 5))
            .with("sides", 4)
            .with("note", "");

        let shape: Shape = from_message(message).unwrap();
        assert_eq!(shape.origin, Point { x: 0, y: 5 });
        assert_eq!(shape.sides, 4);
        assert_eq!(shape.note.as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_keys_dropped() {
        let json = serde_json::json!({ "x": 1, "y": 2, "z": 3 });
        let message = to_message(&point_schema(), &json).unwrap();
        assert_eq!(message.len(), 2);
    }

    #[test]
    fn test_out_of_range_int32() {
        let json = serde_json::json!({ "x": 1_i64 << 40, "y": 0 });
        assert!(matches!(
            to_message(&point_schema(), &json),
            Err(GrpcWebError::SchemaAdaptation(_))
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let json = serde_json::json!({ "x": "one", "y": 0 });
        let err = to_message(&point_schema(), &json).unwrap_err();
        assert!(err.to_string().contains("expected int32, got string"));
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            to_message(&point_schema(), &42),
            Err(GrpcWebError::SchemaAdaptation(_))
        ));
    }

    #[test]
    fn test_from_message_missing_required() {
        let message = Message::new().with("x", 1);
        let result: Result<Point> = from_message(message);
        assert!(matches!(result, Err(GrpcWebError::SchemaAdaptation(_))));
    }
}
