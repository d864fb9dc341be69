//! Bounded frame reader over a complete call body.
//!
//! Unlike a socket buffer, a unary response body is fully received before
//! decoding starts. [`FrameReader`] walks that fixed region and yields frames
//! lazily, sharing the payload memory with the input (`Bytes` slicing):
//! - `Reading`: more bytes remain, the next call yields a frame or an error
//! - `Finished`: the region is consumed, or an error ended the walk
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use grpcweb_client::protocol::{decode_frames, write_frame, FrameId};
//!
//! let mut body = BytesMut::new();
//! write_frame(&mut body, FrameId::Message, b"msg").unwrap();
//! write_frame(&mut body, FrameId::Trailer, b"k: v\r\n").unwrap();
//!
//! let frames: Vec<_> = decode_frames(body.freeze())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].id(), FrameId::Trailer);
//! ```

use bytes::{Buf, Bytes};

use super::frame::{read_frame_limited, Frame, MAX_FRAME_PAYLOAD};
use crate::error::Result;

/// Reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Bytes remain to be framed.
    Reading,
    /// Region exhausted or an error was returned.
    Finished,
}

/// Iterator of frames over one fixed byte region.
///
/// Every trailing byte must belong to a complete frame; an incomplete tail
/// yields one `StreamTruncated` error and ends iteration.
#[derive(Debug, Clone)]
pub struct FrameReader {
    /// Unread part of the region.
    buffer: Bytes,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: usize,
}

impl FrameReader {
    /// Create a reader with no payload limit beyond the 4-byte header maximum.
    pub fn new(buffer: Bytes) -> Self {
        Self::with_max_payload(buffer, MAX_FRAME_PAYLOAD)
    }

    /// Create a reader that rejects frames announcing more than `max_payload_size` bytes.
    pub fn with_max_payload(buffer: Bytes, max_payload_size: usize) -> Self {
        let state = if buffer.is_empty() {
            State::Finished
        } else {
            State::Reading
        };

        Self {
            buffer,
            state,
            max_payload_size,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Whether iteration has ended.
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }
}

impl Iterator for FrameReader {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Finished {
            return None;
        }

        let result = read_frame_limited(&mut self.buffer, self.max_payload_size);

        if result.is_err() || !self.buffer.has_remaining() {
            self.state = State::Finished;
        }

        Some(result)
    }
}

impl std::iter::FusedIterator for FrameReader {}

/// Iterate the frames of a complete body.
///
/// To restart, call again with the same buffer (cloning `Bytes` is cheap).
pub fn decode_frames(buffer: Bytes) -> FrameReader {
    FrameReader::new(buffer)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::error::GrpcWebError;
    use crate::protocol::{write_frame, FrameId};

    fn body(frames: &[(FrameId, &[u8])]) -> Bytes {
        let mut buf = BytesMut::new();
        for (id, payload) in frames {
            write_frame(&mut buf, *id, payload).unwrap();
        }
        buf.freeze()
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut reader = decode_frames(Bytes::new());
        assert!(reader.is_finished());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_multiple_frames_in_order() {
        let input = body(&[
            (FrameId::Message, b"first"),
            (FrameId::Trailer, b"second"),
            (FrameId::Message, b"third"),
        ]);

        let frames: Vec<Frame> = decode_frames(input).collect::<Result<_>>().unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[1].id(), FrameId::Trailer);
        assert_eq!(frames[2].payload(), b"third");
    }

    #[test]
    fn test_lazy_iteration() {
        let input = body(&[(FrameId::Message, b"a"), (FrameId::Message, b"bb")]);
        let total = input.len();
        let mut reader = decode_frames(input);

        assert_eq!(reader.remaining(), total);
        reader.next().unwrap().unwrap();
        assert_eq!(reader.remaining(), 5 + 2);
        assert!(!reader.is_finished());
        reader.next().unwrap().unwrap();
        assert!(reader.is_finished());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_restartable_on_same_buffer() {
        let input = body(&[(FrameId::Message, b"x")]);

        let first: Vec<Frame> = decode_frames(input.clone()).collect::<Result<_>>().unwrap();
        let second: Vec<Frame> = decode_frames(input).collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_trailing_partial_frame_fails() {
        let mut buf = BytesMut::from(&body(&[(FrameId::Message, b"ok")])[..]);
        buf.extend_from_slice(&[0x80, 0x00]);

        let mut reader = decode_frames(buf.freeze());
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(GrpcWebError::StreamTruncated { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_error_fuses_iterator() {
        let input = Bytes::from_static(&[0x42, 0, 0, 0, 0, 0x00, 0, 0, 0, 0]);
        let mut reader = decode_frames(input);

        assert!(matches!(
            reader.next(),
            Some(Err(GrpcWebError::UnknownFrameId(0x42)))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_payload_shares_input_memory() {
        let input = body(&[(FrameId::Message, b"shared")]);
        let payload_ptr = input[5..].as_ptr();

        let frame = decode_frames(input).next().unwrap().unwrap();
        assert_eq!(frame.payload().as_ptr(), payload_ptr);
    }

    #[test]
    fn test_max_payload_validation() {
        let input = body(&[(FrameId::Message, &[0u8; 1000])]);
        let mut reader = FrameReader::with_max_payload(input, 100);

        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_large_payload() {
        let payload = vec![0xAB; 1024 * 1024];
        let input = body(&[(FrameId::Message, &payload)]);

        let frame = decode_frames(input).next().unwrap().unwrap();
        assert_eq!(frame.payload().len(), 1024 * 1024);
        assert!(frame.payload().iter().all(|&b| b == 0xAB));
    }
}
