//! Protocol module - framing and trailers for the call body.
//!
//! This module implements the gRPC-Web body layout:
//! - 5-byte frame header encoding/decoding
//! - Bounded frame reader over a received body
//! - Trailer text block

mod frame;
mod frame_reader;
mod trailers;

pub use frame::{
    build_frame, read_frame, read_frame_limited, write_frame, Frame, FrameId, FRAME_HEADER_SIZE,
    MAX_FRAME_PAYLOAD,
};
pub use frame_reader::{decode_frames, FrameReader};
pub use trailers::{decode_trailers, encode_trailers, Trailers};
