//! Unary call protocol.
//!
//! One call moves through a fixed sequence of states:
//! 1. `Building` - encode the message (and trailers) into frames, base64 the body
//! 2. `Sent` - await the transport exchange (the only suspension point)
//! 3. `Parsing` - base64-decode the response and split it into frames
//! 4. `Done`, or `Failed` on the first error from any step
//!
//! Nothing is retried and nothing outlives the call.
//!
//! # Example
//!
//! ```ignore
//! use grpcweb_client::call::UnaryCall;
//!
//! let mut call = UnaryCall::new(&transport, "https://host/pkg.Greeter/SayHello");
//! let response = call
//!     .invoke(&request_type, &request, &headers, &trailers, &response_type)
//!     .await?;
//! assert_eq!(call.state(), CallState::Done);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;

use crate::codec::{decode_message, encode_message};
use crate::error::{GrpcWebError, Result};
use crate::protocol::{
    decode_trailers, encode_trailers, write_frame, Frame, FrameId, FrameReader, Trailers,
    MAX_FRAME_PAYLOAD,
};
use crate::schema::{Message, MessageType};
use crate::transport::{Headers, Transport};

/// Content type of base64 text-mode gRPC-Web bodies.
pub const GRPC_WEB_TEXT: &str = "application/grpc-web-text";

/// Client identifier header name.
pub const USER_AGENT_HEADER: &str = "X-User-Agent";

/// Client identifier header value.
pub const USER_AGENT: &str = "grpc-web-javascript/0.1";

/// Headers every request carries, overriding caller values of the same name.
pub const PROTOCOL_HEADERS: [(&str, &str); 3] = [
    ("Accept", GRPC_WEB_TEXT),
    ("Content-Type", GRPC_WEB_TEXT),
    (USER_AGENT_HEADER, USER_AGENT),
];

/// Progress of a single unary call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Building,
    Sent,
    Parsing,
    Done,
    Failed,
}

/// Decoded response: the message plus trailer metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallResponse {
    pub message: Message,
    pub trailers: Trailers,
}

/// Build the base64 request body: a MESSAGE frame, then a TRAILER frame if
/// `trailers` is non-empty.
pub fn encode_request(
    schema: &MessageType,
    message: &Message,
    trailers: &Trailers,
) -> Result<Bytes> {
    let payload = encode_message(schema, message)?;

    let mut frames = BytesMut::new();
    write_frame(&mut frames, FrameId::Message, &payload)?;

    if !trailers.is_empty() {
        write_frame(&mut frames, FrameId::Trailer, &encode_trailers(trailers)?)?;
    }

    Ok(Bytes::from(STANDARD.encode(&frames)))
}

/// Merge the protocol headers over `base`.
///
/// Names compare case-insensitively, so a caller's `content-type` is
/// replaced rather than sent alongside.
pub fn request_headers(base: &Headers) -> Headers {
    let mut headers: Headers = base
        .iter()
        .filter(|(name, _)| {
            !PROTOCOL_HEADERS
                .iter()
                .any(|(protocol, _)| protocol.eq_ignore_ascii_case(name))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    for (name, value) in PROTOCOL_HEADERS {
        headers.insert(name.to_string(), value.to_string());
    }

    headers
}

/// Run the exchange through `transport`.
pub async fn perform_exchange<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    headers: &Headers,
    body: Bytes,
) -> Result<Bytes> {
    transport.post(url, headers, body).await
}

/// Decode a base64 response body with no frame size limit.
pub fn decode_response(schema: &MessageType, body: &[u8]) -> Result<CallResponse> {
    decode_response_limited(schema, body, MAX_FRAME_PAYLOAD)
}

/// Decode a base64 response body, rejecting frames above `max_frame_size`.
///
/// # Errors
///
/// - `FrameExpected` for no frames, or a single frame that is not MESSAGE
/// - `UnexpectedFrame` for two frames not in MESSAGE, TRAILER order, or more than two
/// - any base64, framing, codec or trailer error
pub fn decode_response_limited(
    schema: &MessageType,
    body: &[u8],
    max_frame_size: usize,
) -> Result<CallResponse> {
    let raw = decode_base64_body(body)?;
    let frames = FrameReader::with_max_payload(Bytes::from(raw), max_frame_size)
        .collect::<Result<Vec<Frame>>>()?;

    tracing::debug!("Response carried {} frame(s)", frames.len());

    match frames.as_slice() {
        [] => Err(GrpcWebError::FrameExpected),
        [message] if message.is_message() => Ok(CallResponse {
            message: decode_message(schema, message.payload())?,
            trailers: Trailers::new(),
        }),
        [_] => Err(GrpcWebError::FrameExpected),
        [message, trailer] if message.is_message() && trailer.is_trailer() => Ok(CallResponse {
            message: decode_message(schema, message.payload())?,
            trailers: decode_trailers(trailer.payload())?,
        }),
        [first, second] => Err(GrpcWebError::UnexpectedFrame(format!(
            "expected message then trailer, got {:?} then {:?}",
            first.id(),
            second.id()
        ))),
        more => Err(GrpcWebError::UnexpectedFrame(format!(
            "{} frames in a unary response",
            more.len()
        ))),
    }
}

/// Base64-decode a text-mode body.
///
/// Whitespace is ignored. Servers may flush the message and trailer frames
/// as separately padded chunks, so each padded segment is decoded on its own.
fn decode_base64_body(body: &[u8]) -> Result<Vec<u8>> {
    let text: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let mut raw = Vec::with_capacity(text.len() / 4 * 3);
    let mut start = 0;

    for i in 0..text.len() {
        let ends_padding = text[i] == b'=' && text.get(i + 1).map_or(true, |&b| b != b'=');
        if ends_padding {
            STANDARD.decode_vec(&text[start..=i], &mut raw)?;
            start = i + 1;
        }
    }

    if start < text.len() {
        STANDARD.decode_vec(&text[start..], &mut raw)?;
    }

    Ok(raw)
}

/// A single unary call over a borrowed transport.
///
/// One call object makes at most one exchange. Its state can be read once
/// [`invoke`](Self::invoke) returns or its future is dropped.
pub struct UnaryCall<'a, T: ?Sized> {
    transport: &'a T,
    url: &'a str,
    state: CallState,
    max_frame_size: usize,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, T: Transport + ?Sized> UnaryCall<'a, T> {
    pub fn new(transport: &'a T, url: &'a str) -> Self {
        Self {
            transport,
            url,
            state: CallState::Building,
            max_frame_size: MAX_FRAME_PAYLOAD,
            cancel: None,
        }
    }

    /// Reject response frames larger than `max`.
    pub fn max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Abort the exchange with `Cancelled` when `token` fires.
    pub fn cancel_on(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Encode, exchange and decode.
    ///
    /// Ends in `Done` on success, `Failed` otherwise. A future dropped before
    /// completion also leaves the call `Failed`. Both states are final.
    ///
    /// # Errors
    ///
    /// `CallFinished` if this call already ran, without touching the transport.
    pub async fn invoke(
        &mut self,
        request_type: &MessageType,
        message: &Message,
        headers: &Headers,
        trailers: &Trailers,
        response_type: &MessageType,
    ) -> Result<CallResponse> {
        if matches!(self.state, CallState::Done | CallState::Failed) {
            return Err(GrpcWebError::CallFinished(self.state));
        }

        let (transport, url, cancel) = (self.transport, self.url, self.cancel);
        let max_frame_size = self.max_frame_size;
        let mut transitions = Transitions {
            state: &mut self.state,
            url,
        };

        let result = async {
            transitions.to(CallState::Building);
            let body = encode_request(request_type, message, trailers)?;
            let headers = request_headers(headers);

            tracing::debug!("POST {} ({} bytes)", url, body.len());
            transitions.to(CallState::Sent);

            let exchange = perform_exchange(transport, url, &headers, body);
            let response = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(GrpcWebError::Cancelled),
                    response = exchange => response?,
                },
                None => exchange.await?,
            };

            tracing::debug!("Response from {} ({} bytes)", url, response.len());
            transitions.to(CallState::Parsing);

            let decoded = decode_response_limited(response_type, &response, max_frame_size)?;
            transitions.to(CallState::Done);
            Ok::<_, GrpcWebError>(decoded)
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!("Unary call to {} failed in {:?}: {}", url, transitions.state, e);
        }

        result
    }
}

/// State writer for one invocation.
///
/// Dropping it anywhere short of `Done` marks the call `Failed`, so an error
/// return and an abandoned future end the same way.
struct Transitions<'s> {
    state: &'s mut CallState,
    url: &'s str,
}

impl Transitions<'_> {
    fn to(&mut self, next: CallState) {
        tracing::trace!("Call to {}: {:?} -> {:?}", self.url, self.state, next);
        *self.state = next;
    }
}

impl Drop for Transitions<'_> {
    fn drop(&mut self) {
        if *self.state != CallState::Done {
            self.to(CallState::Failed);
        }
    }
}

/// Run one unary call to completion.
pub async fn unary_call<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    request_type: &MessageType,
    message: &Message,
    headers: &Headers,
    trailers: &Trailers,
    response_type: &MessageType,
) -> Result<CallResponse> {
    UnaryCall::new(transport, url)
        .invoke(request_type, message, headers, trailers, response_type)
        .await
}
