//! Codec module - protobuf wire format driven by a [`MessageType`](crate::schema::MessageType).
//!
//! This module implements the subset of the protobuf wire format the call
//! protocol needs:
//!
//! - [`varint`](encode_varint) and length-delimited primitives
//! - field tags and [`WireType`]
//! - recursive message encoding and decoding
//!
//! Only `VARINT` and `LEN` fields are produced. There is no support for
//! repeated fields or fixed-width wire types.
//!
//! # Example
//!
//! ```
//! use grpcweb_client::codec::{decode_varint, encode_varint};
//!
//! let mut buf = Vec::new();
//! encode_varint(300, &mut buf);
//! assert_eq!(buf, [0xAC, 0x02]);
//!
//! let mut input = &buf[..];
//! assert_eq!(decode_varint(&mut input).unwrap(), 300);
//! ```

mod message;
mod varint;
mod wire_type;

pub use message::{
    decode_int32, decode_message, decode_string, encode_int32, encode_message,
    encode_message_into, encode_string,
};
pub use varint::{
    decode_length_delimited, decode_varint, encode_length_delimited, encode_varint,
    encoded_varint_len, MAX_VARINT_LEN,
};
pub use wire_type::{decode_tag, encode_tag, WireType};
