//! `reqwest`-backed HTTP transport.
//!
//! # Example
//!
//! ```ignore
//! use grpcweb_client::transport::{HttpTransport, Transport};
//!
//! let transport = HttpTransport::with_timeout(std::time::Duration::from_secs(5))?;
//! let body = transport.post("https://example.com/pkg.Svc/Method", &headers, body).await?;
//! ```

use std::time::Duration;

use bytes::Bytes;

use super::{BoxFuture, Headers, Transport};
use crate::error::{GrpcWebError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP/1.1 or HTTP/2 POST transport.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GrpcWebError::transport)?;
        Ok(Self { client })
    }

    /// Wrap an existing, caller-configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn post<'a>(
        &'a self,
        url: &'a str,
        headers: &'a Headers,
        body: Bytes,
    ) -> BoxFuture<'a, Result<Bytes>> {
        Box::pin(async move {
            let mut request = self.client.post(url).body(body);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request.send().await.map_err(GrpcWebError::transport)?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!("POST {} returned HTTP {}", url, status);
                return Err(GrpcWebError::transport(format!("HTTP {}", status)));
            }

            response.bytes().await.map_err(GrpcWebError::transport)
        })
    }
}
