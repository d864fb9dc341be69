//! Base-128 varints and length-delimited byte strings.
//!
//! ```text
//! 300 = 0b1_0010_1100  ->  [1010_1100] [0000_0010]
//!                            ^ more      ^ last
//! ```
//!
//! Writers take any [`BufMut`]. Readers consume exactly the bytes they
//! decode; length-delimited reads borrow from a byte slice.

use bytes::{Buf, BufMut};

use crate::error::{GrpcWebError, Result};

/// Longest varint encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Append `value` as a varint, least-significant group first.
pub fn encode_varint<B: BufMut>(mut value: u64, buf: &mut B) {
    while value >= u64::from(CONTINUATION) {
        buf.put_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes [`encode_varint`] emits for `value`.
#[inline]
pub fn encoded_varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Read one varint.
///
/// # Errors
///
/// - `StreamTruncated` if input ends before a byte with the continuation bit clear
/// - `VarintOverflow` if the value does not fit in 64 bits
pub fn decode_varint<B: Buf>(buf: &mut B) -> Result<u64> {
    let mut value = 0u64;

    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(GrpcWebError::truncated(i + 1, i));
        }

        let byte = buf.get_u8();

        // The tenth byte may only carry the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(GrpcWebError::VarintOverflow);
        }

        value |= u64::from(byte & PAYLOAD_MASK) << (7 * i);

        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }

    Err(GrpcWebError::VarintOverflow)
}

/// Append `data` prefixed with its varint length.
pub fn encode_length_delimited<B: BufMut>(data: &[u8], buf: &mut B) {
    encode_varint(data.len() as u64, buf);
    buf.put_slice(data);
}

/// Read a varint length, then borrow exactly that many bytes.
///
/// The returned region shares the input's lifetime; nothing is copied.
///
/// # Errors
///
/// `StreamTruncated` if fewer bytes remain than the length announces.
pub fn decode_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = decode_varint(buf)?;
    let available = buf.len();

    match usize::try_from(len) {
        Ok(len) if len <= available => {
            let whole: &'a [u8] = *buf;
            let (region, rest) = whole.split_at(len);
            *buf = rest;
            Ok(region)
        }
        _ => Err(GrpcWebError::truncated(
            usize::try_from(len).unwrap_or(usize::MAX),
            available,
        )),
    }
}
