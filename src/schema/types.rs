//! Schema descriptors: primitive, optional and message field types.

use std::collections::HashMap;
use std::sync::Arc;

use super::Value;
use crate::error::{GrpcWebError, Result};

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Leaf value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int32,
    String,
}

/// Declared type of a message field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A primitive leaf.
    Primitive(PrimitiveType),
    /// A nested message, shared with any other schema that embeds it.
    Message(Arc<MessageType>),
    /// A base type with a declared default (implicit presence).
    Optional(Box<OptionalType>),
}

/// Base type plus the default value that is elided on the wire.
#[derive(Debug, Clone)]
pub struct OptionalType {
    base: FieldType,
    default: Value,
}

impl OptionalType {
    pub fn new(base: impl Into<FieldType>, default: impl Into<Value>) -> Self {
        Self {
            base: base.into(),
            default: default.into(),
        }
    }

    /// The wrapped type.
    pub fn base(&self) -> &FieldType {
        &self.base
    }

    /// The value that is omitted on encode and assumed on decode.
    pub fn default_value(&self) -> &Value {
        &self.default
    }
}

impl FieldType {
    /// Strip any optional wrappers down to the primitive or message type.
    pub fn base(&self) -> &FieldType {
        match self {
            FieldType::Optional(opt) => opt.base.base(),
            other => other,
        }
    }

    /// Declared default if this field is optional.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            FieldType::Optional(opt) => Some(&opt.default),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    /// Name of the base value kind, matching [`Value::type_name`].
    pub fn type_name(&self) -> &'static str {
        match self.base() {
            FieldType::Primitive(PrimitiveType::Int32) => "int32",
            FieldType::Primitive(PrimitiveType::String) => "string",
            _ => "message",
        }
    }

    /// Whether `value` has the kind this type expects.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self.base(), value),
            (FieldType::Primitive(PrimitiveType::Int32), Value::Int32(_))
                | (FieldType::Primitive(PrimitiveType::String), Value::String(_))
                | (FieldType::Message(_), Value::Message(_))
        )
    }
}

impl From<PrimitiveType> for FieldType {
    fn from(p: PrimitiveType) -> Self {
        FieldType::Primitive(p)
    }
}

impl From<Arc<MessageType>> for FieldType {
    fn from(m: Arc<MessageType>) -> Self {
        FieldType::Message(m)
    }
}

impl From<MessageType> for FieldType {
    fn from(m: MessageType) -> Self {
        FieldType::Message(Arc::new(m))
    }
}

impl From<OptionalType> for FieldType {
    fn from(o: OptionalType) -> Self {
        FieldType::Optional(Box::new(o))
    }
}

/// One registered field.
#[derive(Debug, Clone)]
pub struct Field {
    number: u32,
    name: String,
    ty: FieldType,
}

impl Field {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }
}

/// Message descriptor.
///
/// Fields keep their registration order, which is also the encode order.
/// Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct MessageType {
    fields: Vec<Field>,
    by_number: HashMap<u32, usize>,
}

impl MessageType {
    pub fn builder() -> MessageTypeBuilder {
        MessageTypeBuilder::new()
    }

    /// Fields in registration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by number.
    pub fn field(&self, number: u32) -> Option<&Field> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }

    /// Look up a field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`MessageType`].
///
/// Validation is deferred to [`build`](Self::build) so field declarations
/// chain without intermediate `?`.
#[derive(Debug, Default)]
pub struct MessageTypeBuilder {
    fields: Vec<Field>,
}

impl MessageTypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a required field.
    pub fn field(mut self, number: u32, name: &str, ty: impl Into<FieldType>) -> Self {
        self.fields.push(Field {
            number,
            name: name.to_string(),
            ty: ty.into(),
        });
        self
    }

    /// Register a field with a default value that is elided on encode.
    pub fn optional(
        self,
        number: u32,
        name: &str,
        ty: impl Into<FieldType>,
        default: impl Into<Value>,
    ) -> Self {
        self.field(number, name, OptionalType::new(ty, default))
    }

    /// Register a nested message field.
    pub fn message(self, number: u32, name: &str, ty: Arc<MessageType>) -> Self {
        self.field(number, name, FieldType::Message(ty))
    }

    /// Validate and freeze the descriptor.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if a field number is outside `1..=MAX_FIELD_NUMBER`,
    /// a number or name is registered twice, or an optional default does not
    /// match its base type.
    pub fn build(self) -> Result<MessageType> {
        let mut by_number = HashMap::with_capacity(self.fields.len());

        for (i, field) in self.fields.iter().enumerate() {
            if field.number == 0 || field.number > MAX_FIELD_NUMBER {
                return Err(GrpcWebError::InvalidSchema(format!(
                    "field {:?} has out-of-range number {}",
                    field.name, field.number
                )));
            }

            if by_number.insert(field.number, i).is_some() {
                return Err(GrpcWebError::InvalidSchema(format!(
                    "field number {} registered twice",
                    field.number
                )));
            }

            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(GrpcWebError::InvalidSchema(format!(
                    "field name {:?} registered twice",
                    field.name
                )));
            }

            if let Some(default) = field.ty.default_value() {
                if !field.ty.accepts(default) {
                    return Err(GrpcWebError::InvalidSchema(format!(
                        "default for field {:?} must be {}, got {}",
                        field.name,
                        field.ty.type_name(),
                        default.type_name()
                    )));
                }
            }
        }

        Ok(MessageType {
            fields: self.fields,
            by_number,
        })
    }
}
