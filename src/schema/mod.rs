//! Schema model - static message descriptors and runtime values.
//!
//! A [`MessageType`] maps field numbers to names and [`FieldType`]s. It is
//! built once through [`MessageType::builder`], then shared read-only (usually
//! behind an `Arc`) across any number of concurrent calls.
//!
//! # Example
//!
//! ```
//! use grpcweb_client::schema::{Message, MessageType, PrimitiveType};
//!
//! let schema = MessageType::builder()
//!     .field(1, "id", PrimitiveType::Int32)
//!     .optional(2, "name", PrimitiveType::String, "")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.field(1).unwrap().name(), "id");
//!
//! let msg = Message::new().with("id", 7).with("name", "seven");
//! assert_eq!(msg.get_int32("id"), Some(7));
//! ```

mod types;
mod value;

pub use types::{
    Field, FieldType, MessageType, MessageTypeBuilder, OptionalType, PrimitiveType,
    MAX_FIELD_NUMBER,
};
pub use value::{Message, Value};
