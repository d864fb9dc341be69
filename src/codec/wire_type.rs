//! Wire types and field tags.
//!
//! A tag is the varint `(field_number << 3) | wire_type`.

use bytes::{Buf, BufMut};

use super::varint::{decode_varint, encode_varint};
use crate::error::{GrpcWebError, Result};
use crate::schema::{FieldType, PrimitiveType};

const WIRE_TYPE_BITS: u32 = 3;
const WIRE_TYPE_MASK: u64 = 0b111;

/// On-wire encoding of a field value.
///
/// Only `Varint` and `Len` are ever written; `I64` and `I32` are recognized
/// in incoming tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    I64 = 1,
    Len = 2,
    I32 = 5,
}

impl WireType {
    /// Wire type a field of type `ty` is written with.
    pub fn of(ty: &FieldType) -> WireType {
        match ty.base() {
            FieldType::Primitive(PrimitiveType::Int32) => WireType::Varint,
            _ => WireType::Len,
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = GrpcWebError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            other => Err(GrpcWebError::UnknownWireType(other)),
        }
    }
}

/// Append a field tag.
#[inline]
pub fn encode_tag<B: BufMut>(field_number: u32, wire_type: WireType, buf: &mut B) {
    let tag = (u64::from(field_number) << WIRE_TYPE_BITS) | wire_type as u64;
    encode_varint(tag, buf);
}

/// Read a field tag, returning `(field_number, wire_type)`.
///
/// # Errors
///
/// Varint errors, or `UnknownWireType` for wire types 3, 4, 6 and 7.
pub fn decode_tag<B: Buf>(buf: &mut B) -> Result<(u64, WireType)> {
    let tag = decode_varint(buf)?;
    let wire_type = WireType::try_from((tag & WIRE_TYPE_MASK) as u8)?;
    Ok((tag >> WIRE_TYPE_BITS, wire_type))
}
