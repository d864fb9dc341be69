//! Error types for grpcweb-client.

use thiserror::Error;

use crate::call::CallState;

/// Main error type for all codec, framing and call operations.
#[derive(Debug, Error)]
pub enum GrpcWebError {
    /// Input ended before a varint, length-delimited value or frame was complete.
    #[error("Stream truncated: needed {needed} bytes, {available} available")]
    StreamTruncated { needed: usize, available: usize },

    /// Varint longer than 10 bytes or wider than 64 bits.
    #[error("Varint overflows 64 bits")]
    VarintOverflow,

    /// Tag carries a wire type outside VARINT/I64/LEN/I32.
    #[error("Unknown wire type: {0}")]
    UnknownWireType(u8),

    /// Frame tag byte is neither MESSAGE nor TRAILER.
    #[error("Unknown frame id: {0:#04x}")]
    UnknownFrameId(u8),

    /// Field number on the wire is absent from the schema.
    #[error("Unknown field number: {0}")]
    UnknownField(u64),

    /// Response carried no MESSAGE frame where one was required.
    #[error("Expected a message frame")]
    FrameExpected,

    /// Response frames arrived in an order or count the protocol does not allow.
    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(String),

    /// Trailer line without a colon separator, or a trailer that cannot be
    /// written as one line.
    #[error("Malformed trailer line: {0:?}")]
    MalformedTrailer(String),

    /// Frame payload exceeds what the header can carry or what the caller accepts.
    #[error("Frame payload of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// String field or trailer block is not UTF-8.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Response body is not valid base64.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Required field missing from the value being encoded.
    #[error("Missing value for field {0:?}")]
    MissingField(String),

    /// Value kind does not match the declared field type.
    #[error("Field {field:?} expected a value of type {expected}")]
    TypeMismatch { field: String, expected: &'static str },

    /// Schema construction rejected (bad or duplicate field number).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Method not present in the service definition.
    #[error("Unknown method {method:?} on service {service:?}")]
    UnknownMethod { service: String, method: String },

    /// Opaque failure reported by the transport collaborator.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failure converting between a decoded message and a caller type.
    #[error("Schema adaptation error: {0}")]
    SchemaAdaptation(#[from] serde_json::Error),

    /// Call cancelled while the exchange was in flight.
    #[error("Call cancelled")]
    Cancelled,

    /// `invoke` on a call that already reached `Done` or `Failed`.
    #[error("Call already finished ({0:?})")]
    CallFinished(CallState),
}

impl GrpcWebError {
    /// Wrap any transport-level error.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Transport(err.into())
    }

    /// Shorthand for a truncated read.
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::StreamTruncated { needed, available }
    }
}

/// Result type alias using GrpcWebError.
pub type Result<T> = std::result::Result<T, GrpcWebError>;
