//! Frame encoding and decoding.
//!
//! Implements the 5-byte frame header:
//! ```text
//! ┌──────────┬──────────┬─────────────────┐
//! │ Frame ID │ Length   │ Payload         │
//! │ 1 byte   │ 4 bytes  │ Length bytes    │
//! │          │ uint32 BE│                 │
//! └──────────┴──────────┴─────────────────┘
//! ```
//!
//! Uses `bytes::Bytes` for zero-copy payload sharing.
//!
//! # Example
//!
//! ```
//! use grpcweb_client::protocol::{build_frame, read_frame, FrameId};
//!
//! let bytes = build_frame(FrameId::Message, b"abc").unwrap();
//! assert_eq!(&bytes[..], &[0x00, 0, 0, 0, 3, b'a', b'b', b'c']);
//!
//! let mut input = &bytes[..];
//! let frame = read_frame(&mut input).unwrap();
//! assert_eq!(frame.id(), FrameId::Message);
//! assert_eq!(frame.payload(), b"abc");
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{GrpcWebError, Result};

/// Header size in bytes (fixed, exactly 5).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Largest payload a 4-byte length can describe.
pub const MAX_FRAME_PAYLOAD: usize = u32::MAX as usize;

/// Frame tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameId {
    /// Carries one encoded message.
    Message = 0x00,
    /// Carries the trailer text block.
    Trailer = 0x80,
}

impl FrameId {
    /// Raw tag byte.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FrameId {
    type Error = GrpcWebError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(FrameId::Message),
            0x80 => Ok(FrameId::Trailer),
            other => Err(GrpcWebError::UnknownFrameId(other)),
        }
    }
}

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: FrameId,
    payload: Bytes,
}

impl Frame {
    /// Create a new frame from id and payload.
    pub fn new(id: FrameId, payload: Bytes) -> Self {
        Self { id, payload }
    }

    #[inline]
    pub fn id(&self) -> FrameId {
        self.id
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn is_message(&self) -> bool {
        self.id == FrameId::Message
    }

    #[inline]
    pub fn is_trailer(&self) -> bool {
        self.id == FrameId::Trailer
    }
}

/// Append a frame header and payload to `buf`.
///
/// # Errors
///
/// `FrameTooLarge` if the payload length does not fit in 4 bytes.
pub fn write_frame<B: BufMut>(buf: &mut B, id: FrameId, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| GrpcWebError::FrameTooLarge {
        size: payload.len(),
        max: MAX_FRAME_PAYLOAD,
    })?;

    buf.put_u8(id.as_byte());
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(())
}

/// Build a complete frame as a single buffer.
pub fn build_frame(id: FrameId, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    write_frame(&mut buf, id, payload)?;
    Ok(buf.freeze())
}

/// Read one frame from the front of `buf`, consuming it.
///
/// # Errors
///
/// - `StreamTruncated` if the 5 header bytes or the announced payload are incomplete
/// - `UnknownFrameId` if the tag byte is neither MESSAGE nor TRAILER
pub fn read_frame<B: Buf>(buf: &mut B) -> Result<Frame> {
    read_frame_limited(buf, MAX_FRAME_PAYLOAD)
}

/// [`read_frame`] that additionally rejects payloads above `max_payload`.
///
/// The header is validated before any payload byte is consumed.
pub fn read_frame_limited<B: Buf>(buf: &mut B, max_payload: usize) -> Result<Frame> {
    let available = buf.remaining();
    if available < FRAME_HEADER_SIZE {
        return Err(GrpcWebError::truncated(FRAME_HEADER_SIZE, available));
    }

    let id = FrameId::try_from(buf.chunk()[0])?;
    buf.advance(1);
    let len = buf.get_u32() as usize;

    if len > max_payload {
        return Err(GrpcWebError::FrameTooLarge {
            size: len,
            max: max_payload,
        });
    }

    if buf.remaining() < len {
        return Err(GrpcWebError::truncated(len, buf.remaining()));
    }

    Ok(Frame::new(id, buf.copy_to_bytes(len)))
}
