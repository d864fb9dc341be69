//! Client builder and call dispatch.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the base URL,
//! default metadata and transport. The [`Client`] dispatches unary calls:
//! 1. Resolve the method and its schemas
//! 2. Merge default and per-call headers/trailers
//! 3. Run the [`UnaryCall`](crate::call::UnaryCall) protocol over the transport
//!
//! # Example
//!
//! ```ignore
//! use grpcweb_client::{CallOptions, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder("https://api.example.com")
//!         .header("Authorization", "Bearer token")
//!         .timeout(std::time::Duration::from_secs(10))
//!         .build()?;
//!
//!     let response = client
//!         .call(&greeter, "SayHello", &request, &CallOptions::new())
//!         .await?;
//!
//!     println!("{:?}", response.message.get_str("message"));
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::adapter::SchemaProvider;
use crate::call::{CallResponse, UnaryCall};
use crate::error::Result;
use crate::protocol::Trailers;
use crate::schema::{Message, MessageType};
use crate::service::ServiceDefinition;
use crate::transport::{Headers, HttpTransport, Transport, DEFAULT_TIMEOUT};

/// Default maximum response frame payload (4 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    base_url: String,
    headers: Headers,
    trailers: Trailers,
    transport: Option<Arc<dyn Transport>>,
    max_frame_size: usize,
    timeout: Duration,
}

impl ClientBuilder {
    /// Create a builder for a server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Headers::new(),
            trailers: Trailers::new(),
            transport: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a header sent with every call.
    ///
    /// Protocol headers (`Accept`, `Content-Type`, `X-User-Agent`) cannot be
    /// overridden this way.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Add a trailer sent with every call.
    pub fn trailer(mut self, name: &str, value: &str) -> Self {
        self.trailers.insert(name.to_string(), value.to_string());
        self
    }

    /// Use a custom transport instead of the default [`HttpTransport`].
    ///
    /// The timeout setting does not apply to custom transports.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the maximum accepted response frame payload.
    ///
    /// Default: 4 MiB
    pub fn max_frame_size(mut self, limit: usize) -> Self {
        self.max_frame_size = limit;
        self
    }

    /// Set the request timeout of the default transport.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// Creates an [`HttpTransport`] if none was supplied.
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_timeout(self.timeout)?),
        };

        Ok(Client {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            headers: self.headers,
            trailers: self.trailers,
            transport,
            max_frame_size: self.max_frame_size,
        })
    }
}

/// Per-call metadata and cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    headers: Headers,
    trailers: Trailers,
    cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header for this call, overriding a client default of the same
    /// name in any letter case.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Add a trailer for this call, overriding a client default of the same
    /// name in any letter case.
    pub fn trailer(mut self, name: &str, value: &str) -> Self {
        self.trailers.insert(name.to_string(), value.to_string());
        self
    }

    /// Fail the call with `Cancelled` if `token` fires during the exchange.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A configured gRPC-Web client.
///
/// Cheap to clone; clones share the transport. Calls hold no shared mutable
/// state, so any number may run concurrently.
#[derive(Clone)]
pub struct Client {
    base_url: String,
    headers: Headers,
    trailers: Trailers,
    transport: Arc<dyn Transport>,
    max_frame_size: usize,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a method: `<base_url>/<service>/<method>`.
    pub fn method_url(&self, service: &str, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, service, method)
    }

    /// Call `method` of `service` with a schema-shaped message.
    ///
    /// # Errors
    ///
    /// `UnknownMethod` if the service does not define `method`; otherwise the
    /// first error of the call protocol.
    pub async fn call(
        &self,
        service: &ServiceDefinition,
        method: &str,
        message: &Message,
        options: &CallOptions,
    ) -> Result<CallResponse> {
        let descriptor = service.resolve(method)?;
        let url = self.method_url(service.name(), descriptor.name());

        self.call_url(
            &url,
            descriptor.request(),
            message,
            descriptor.response(),
            options,
        )
        .await
    }

    /// Call a method with typed request and response values.
    ///
    /// Schemas come from the types' [`SchemaProvider`] impls; adaptation
    /// errors from either side are returned unchanged.
    pub async fn call_typed<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: &Req,
        options: &CallOptions,
    ) -> Result<(Resp, Trailers)>
    where
        Req: SchemaProvider,
        Resp: SchemaProvider,
    {
        let url = self.method_url(service, method);
        let message = request.to_message()?;
        let request_type = Req::message_type();
        let response_type = Resp::message_type();

        let response = self
            .call_url(&url, &request_type, &message, &response_type, options)
            .await?;

        Ok((Resp::from_message(response.message)?, response.trailers))
    }

    async fn call_url(
        &self,
        url: &str,
        request_type: &MessageType,
        message: &Message,
        response_type: &MessageType,
        options: &CallOptions,
    ) -> Result<CallResponse> {
        let headers = merge_metadata(&self.headers, &options.headers);
        let trailers = merge_metadata(&self.trailers, &options.trailers);

        let mut call =
            UnaryCall::new(self.transport.as_ref(), url).max_frame_size(self.max_frame_size);
        if let Some(token) = &options.cancel {
            call = call.cancel_on(token);
        }

        call.invoke(request_type, message, &headers, &trailers, response_type)
            .await
    }
}

/// Lay `overrides` over `defaults`. Names compare case-insensitively, so an
/// override replaces a default spelled differently instead of joining it.
fn merge_metadata(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = defaults
        .iter()
        .filter(|(name, _)| !overrides.keys().any(|o| o.eq_ignore_ascii_case(name)))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    merged.extend(overrides.iter().map(|(n, v)| (n.clone(), v.clone())));
    merged
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("trailers", &self.trailers)
            .field("max_frame_size", &self.max_frame_size)
            .finish_non_exhaustive()
    }
}
