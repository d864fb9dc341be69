//! Schema-driven message encoding and decoding.
//!
//! Encoding walks the schema in registration order. Decoding walks the wire
//! and looks each tag up in the schema; the last occurrence of a field wins.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::varint::{
    decode_length_delimited, decode_varint, encode_length_delimited, encode_varint,
};
use super::wire_type::{decode_tag, encode_tag, WireType};
use crate::error::{GrpcWebError, Result};
use crate::schema::{FieldType, Message, MessageType, PrimitiveType, Value};

/// Encode `message` against `schema` into a fresh buffer.
///
/// # Example
///
/// ```
/// use grpcweb_client::codec::{decode_message, encode_message};
/// use grpcweb_client::schema::{Message, MessageType, PrimitiveType};
///
/// let schema = MessageType::builder()
///     .field(1, "a", PrimitiveType::Int32)
///     .field(2, "b", PrimitiveType::String)
///     .build()
///     .unwrap();
///
/// let msg = Message::new().with("a", 42).with("b", "hi");
/// let bytes = encode_message(&schema, &msg).unwrap();
/// assert_eq!(&bytes[..], &[0x08, 42, 0x12, 2, b'h', b'i']);
/// assert_eq!(decode_message(&schema, &bytes).unwrap(), msg);
/// ```
pub fn encode_message(schema: &MessageType, message: &Message) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_message_into(schema, message, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode `message` against `schema`, appending to `buf`.
///
/// Optional fields that are absent or equal to their default are skipped.
///
/// # Errors
///
/// - `MissingField` if a required field has no value
/// - `TypeMismatch` if a value's kind differs from its declared type
pub fn encode_message_into<B: BufMut>(
    schema: &MessageType,
    message: &Message,
    buf: &mut B,
) -> Result<()> {
    for field in schema.fields() {
        let ty = field.field_type();

        let value = match message.get(field.name()) {
            Some(value) => value,
            None if ty.is_optional() => continue,
            None => return Err(GrpcWebError::MissingField(field.name().to_string())),
        };

        if ty.default_value() == Some(value) {
            continue;
        }

        if !ty.accepts(value) {
            return Err(GrpcWebError::TypeMismatch {
                field: field.name().to_string(),
                expected: ty.type_name(),
            });
        }

        encode_tag(field.number(), WireType::of(ty), buf);
        encode_value(field.name(), ty.base(), value, buf)?;
    }

    Ok(())
}

fn encode_value<B: BufMut>(name: &str, ty: &FieldType, value: &Value, buf: &mut B) -> Result<()> {
    match (ty, value) {
        (FieldType::Primitive(PrimitiveType::Int32), Value::Int32(v)) => encode_int32(*v, buf),
        (FieldType::Primitive(PrimitiveType::String), Value::String(s)) => encode_string(s, buf),
        (FieldType::Message(schema), Value::Message(m)) => {
            let inner = encode_message(schema, m)?;
            encode_length_delimited(&inner, buf);
        }
        (FieldType::Optional(opt), value) => return encode_value(name, opt.base(), value, buf),
        (ty, _) => {
            return Err(GrpcWebError::TypeMismatch {
                field: name.to_string(),
                expected: ty.type_name(),
            })
        }
    }
    Ok(())
}

/// Write an INT32 as a plain varint of its 32-bit pattern (no zig-zag).
#[inline]
pub fn encode_int32<B: BufMut>(value: i32, buf: &mut B) {
    encode_varint(u64::from(value as u32), buf);
}

/// Write a STRING as length-delimited UTF-8.
#[inline]
pub fn encode_string<B: BufMut>(value: &str, buf: &mut B) {
    encode_length_delimited(value.as_bytes(), buf);
}

/// Decode a complete message region against `schema`.
///
/// `data` must hold exactly one message; decoding stops only when it is
/// exhausted. Optional fields missing from the wire are filled with their
/// default; missing required fields leave no entry.
///
/// # Errors
///
/// - `UnknownField` for a field number the schema does not declare
/// - `UnknownWireType`, `StreamTruncated`, `VarintOverflow`, `InvalidUtf8`
pub fn decode_message(schema: &MessageType, data: &[u8]) -> Result<Message> {
    let mut buf = data;
    let mut message = Message::new();

    while buf.has_remaining() {
        let (number, _wire_type) = decode_tag(&mut buf)?;

        let field = u32::try_from(number)
            .ok()
            .and_then(|n| schema.field(n))
            .ok_or(GrpcWebError::UnknownField(number))?;

        let value = decode_value(field.field_type(), &mut buf)?;
        message.insert(field.name(), value);
    }

    for field in schema.fields() {
        if let Some(default) = field.field_type().default_value() {
            if !message.contains(field.name()) {
                message.insert(field.name(), default.clone());
            }
        }
    }

    Ok(message)
}

fn decode_value(ty: &FieldType, buf: &mut &[u8]) -> Result<Value> {
    match ty {
        FieldType::Primitive(PrimitiveType::Int32) => decode_int32(buf).map(Value::Int32),
        FieldType::Primitive(PrimitiveType::String) => decode_string(buf).map(Value::String),
        FieldType::Message(schema) => {
            let region = decode_length_delimited(buf)?;
            decode_message(schema, region).map(Value::Message)
        }
        FieldType::Optional(opt) => decode_value(opt.base(), buf),
    }
}

/// Read an INT32 varint, keeping its low 32 bits.
///
/// Accepts both the 5-byte form this crate writes and the 10-byte
/// sign-extended form of standard encoders.
pub fn decode_int32(buf: &mut &[u8]) -> Result<i32> {
    Ok(decode_varint(buf)? as u32 as i32)
}

/// Read a length-delimited UTF-8 string.
pub fn decode_string(buf: &mut &[u8]) -> Result<String> {
    let bytes = decode_length_delimited(buf)?;
    Ok(std::str::from_utf8(bytes)?.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn simple_schema() -> MessageType {
        MessageType::builder()
            .field(1, "a", PrimitiveType::Int32)
            .field(2, "b", PrimitiveType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_round_trip_simple() {
        let schema = simple_schema();
        let msg = Message::new().with("a", 42).with("b", "hi");

        let bytes = encode_message(&schema, &msg).unwrap();
        assert_eq!(decode_message(&schema, &bytes).unwrap(), msg);
    }

    #[test]
    fn test_encode_follows_registration_order() {
        let schema = MessageType::builder()
            .field(2, "b", PrimitiveType::Int32)
            .field(1, "a", PrimitiveType::Int32)
            .build()
            .unwrap();
        let msg = Message::new().with("a", 1).with("b", 2);

        let bytes = encode_message(&schema, &msg).unwrap();
        assert_eq!(&bytes[..], &[0x10, 2, 0x08, 1]);
    }

    #[test]
    fn test_optional_default_elided() {
        let schema = MessageType::builder()
            .optional(1, "count", PrimitiveType::Int32, 0)
            .field(2, "name", PrimitiveType::String)
            .build()
            .unwrap();
        let msg = Message::new().with("count", 0).with("name", "x");

        let bytes = encode_message(&schema, &msg).unwrap();
        assert_eq!(&bytes[..], &[0x12, 1, b'x']);

        let decoded = decode_message(&schema, &bytes).unwrap();
        assert_eq!(decoded.get_int32("count"), Some(0));
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_optional_non_default_written() {
        let schema = MessageType::builder()
            .optional(1, "label", PrimitiveType::String, "none")
            .build()
            .unwrap();

        let bytes = encode_message(&schema, &Message::new().with("label", "")).unwrap();
        assert_eq!(&bytes[..], &[0x0A, 0]);

        let skipped = encode_message(&schema, &Message::new().with("label", "none")).unwrap();
        assert!(skipped.is_empty());

        let absent = encode_message(&schema, &Message::new()).unwrap();
        assert!(absent.is_empty());
        assert_eq!(
            decode_message(&schema, &absent).unwrap().get_str("label"),
            Some("none")
        );
    }

    #[test]
    fn test_nested_messages() {
        let point = Arc::new(
            MessageType::builder()
                .field(1, "x", PrimitiveType::Int32)
                .field(2, "y", PrimitiveType::Int32)
                .build()
                .unwrap(),
        );
        let line = MessageType::builder()
            .message(1, "from", point.clone())
            .message(2, "to", point)
            .field(3, "label", PrimitiveType::String)
            .build()
            .unwrap();

        let msg = Message::new()
            .with("from", Message::new().with("x", 1).with("y", 2))
            .with("to", Message::new().with("x", 300).with("y", 4))
            .with("label", "diag");

        let bytes = encode_message(&line, &msg).unwrap();
        assert_eq!(&bytes[..4], &[0x0A, 4, 0x08, 1]);
        assert_eq!(decode_message(&line, &bytes).unwrap(), msg);
    }

    #[test]
    fn test_negative_int32_uses_32_bit_pattern() {
        let schema = MessageType::builder()
            .field(1, "v", PrimitiveType::Int32)
            .build()
            .unwrap();
        let msg = Message::new().with("v", -1);

        let bytes = encode_message(&schema, &msg).unwrap();
        assert_eq!(&bytes[..], &[0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(decode_message(&schema, &bytes).unwrap(), msg);

        // Sign-extended 10-byte form from a standard encoder.
        let mut wire = vec![0x08];
        encode_varint(-1i64 as u64, &mut wire);
        assert_eq!(decode_message(&schema, &wire).unwrap(), msg);
    }

    #[test]
    fn test_int32_extremes() {
        let schema = MessageType::builder()
            .field(1, "v", PrimitiveType::Int32)
            .build()
            .unwrap();

        for v in [i32::MIN, -2, 0, 1, i32::MAX] {
            let msg = Message::new().with("v", v);
            let bytes = encode_message(&schema, &msg).unwrap();
            assert_eq!(decode_message(&schema, &bytes).unwrap(), msg);
        }
    }

    #[test]
    fn test_decode_unknown_field() {
        let schema = simple_schema();
        let wire = [0x18, 0x01]; // field 3, varint
        assert!(matches!(
            decode_message(&schema, &wire),
            Err(GrpcWebError::UnknownField(3))
        ));
    }

    #[test]
    fn test_decode_huge_field_number_is_unknown() {
        let schema = simple_schema();
        let mut wire = Vec::new();
        encode_varint(u64::from(u32::MAX) << 4, &mut wire);
        assert!(matches!(
            decode_message(&schema, &wire),
            Err(GrpcWebError::UnknownField(_))
        ));
    }

    #[test]
    fn test_decode_duplicate_field_last_wins() {
        let schema = simple_schema();
        let wire = [0x08, 1, 0x08, 2];
        assert_eq!(decode_message(&schema, &wire).unwrap().get_int32("a"), Some(2));
    }

    #[test]
    fn test_decode_missing_required_leaves_no_entry() {
        let schema = simple_schema();
        let decoded = decode_message(&schema, &[0x08, 7]).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(!decoded.contains("b"));
    }

    #[test]
    fn test_decode_empty_region() {
        let schema = simple_schema();
        assert!(decode_message(&schema, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_string() {
        let schema = simple_schema();
        let wire = [0x12, 5, b'h', b'i'];
        assert!(matches!(
            decode_message(&schema, &wire),
            Err(GrpcWebError::StreamTruncated { needed: 5, available: 2 })
        ));
    }

    #[test]
    fn test_decode_truncated_nested_region() {
        let inner = Arc::new(simple_schema());
        let outer = MessageType::builder()
            .message(1, "inner", inner)
            .build()
            .unwrap();

        // Nested length says 4, only 2 follow.
        let wire = [0x0A, 4, 0x08, 1];
        assert!(matches!(
            decode_message(&outer, &wire),
            Err(GrpcWebError::StreamTruncated { .. })
        ));
    }

    #[test]
    fn test_nested_region_bounds_inner_decode() {
        let inner = Arc::new(simple_schema());
        let outer = MessageType::builder()
            .message(1, "inner", inner)
            .field(2, "tail", PrimitiveType::Int32)
            .build()
            .unwrap();

        // inner = {a: 5}, then outer field 2 = 9. Field 2 must not leak into inner.
        let wire = [0x0A, 2, 0x08, 5, 0x10, 9];
        let decoded = decode_message(&outer, &wire).unwrap();
        assert_eq!(decoded.get_message("inner").unwrap().len(), 1);
        assert_eq!(decoded.get_int32("tail"), Some(9));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let schema = simple_schema();
        let wire = [0x12, 2, 0xC3, 0x28];
        assert!(matches!(
            decode_message(&schema, &wire),
            Err(GrpcWebError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_decode_unknown_wire_type() {
        let schema = simple_schema();
        let wire = [(1 << 3) | 7, 0];
        assert!(matches!(
            decode_message(&schema, &wire),
            Err(GrpcWebError::UnknownWireType(7))
        ));
    }

    #[test]
    fn test_encode_missing_required_field() {
        let schema = simple_schema();
        let msg = Message::new().with("a", 1);
        assert!(matches!(
            encode_message(&schema, &msg),
            Err(GrpcWebError::MissingField(name)) if name == "b"
        ));
    }

    #[test]
    fn test_encode_type_mismatch() {
        let schema = simple_schema();
        let msg = Message::new().with("a", "not a number").with("b", "x");
        match encode_message(&schema, &msg) {
            Err(GrpcWebError::TypeMismatch { field, expected }) => {
                assert_eq!(field, "a");
                assert_eq!(expected, "int32");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_ignores_extra_values() {
        let schema = simple_schema();
        let msg = Message::new().with("a", 1).with("b", "x").with("zzz", 9);
        let bytes = encode_message(&schema, &msg).unwrap();
        assert_eq!(&bytes[..], &[0x08, 1, 0x12, 1, b'x']);
    }
}
