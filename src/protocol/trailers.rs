//! Trailer text block.
//!
//! ```text
//! grpc-status: 0\r\n
//! grpc-message: OK\r\n
//! ```

use std::collections::BTreeMap;

use crate::error::{GrpcWebError, Result};

/// Call-scoped string metadata. Keys are unique; later writes win.
pub type Trailers = BTreeMap<String, String>;

const LINE_TERMINATOR: &str = "\r\n";

/// Serialize `trailers` as `key: value\r\n` lines in map order.
///
/// # Errors
///
/// `MalformedTrailer` if a key or value contains CR or LF, or a key contains
/// a colon. Either would change how the block splits on decode.
pub fn encode_trailers(trailers: &Trailers) -> Result<Vec<u8>> {
    let mut text = String::new();
    for (key, value) in trailers {
        if key.contains(':') || has_line_break(key) || has_line_break(value) {
            return Err(GrpcWebError::MalformedTrailer(format!("{}: {}", key, value)));
        }

        text.push_str(key);
        text.push_str(": ");
        text.push_str(value);
        text.push_str(LINE_TERMINATOR);
    }
    Ok(text.into_bytes())
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// Parse a trailer block.
///
/// Lines split at the first colon; key and value are trimmed. The empty
/// segment after the final terminator is ignored, and a last line missing its
/// terminator is still parsed.
///
/// # Errors
///
/// - `InvalidUtf8` if the block is not UTF-8
/// - `MalformedTrailer` for a line without a colon
pub fn decode_trailers(data: &[u8]) -> Result<Trailers> {
    let text = std::str::from_utf8(data)?;
    let mut lines: Vec<&str> = text.split(LINE_TERMINATOR).collect();

    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut trailers = Trailers::new();
    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| GrpcWebError::MalformedTrailer(line.to_string()))?;
        trailers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(trailers)
}
