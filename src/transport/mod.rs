//! Transport module - the HTTP exchange behind a unary call.
//!
//! The call protocol only needs one operation: POST a body with headers to a
//! URL and hand back the raw response body. [`Transport`] is that seam;
//! [`HttpTransport`] is the default implementation over `reqwest`.
//! Connection management, TLS, timeouts and retries all live behind it.

mod http;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;

pub use http::{HttpTransport, DEFAULT_TIMEOUT};

/// Request headers, name to value.
pub type Headers = BTreeMap<String, String>;

/// Boxed future for transport results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for the request/response exchange.
///
/// Implementations report every failure as
/// [`GrpcWebError::Transport`](crate::GrpcWebError::Transport) and return the
/// response body untouched.
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the response body.
    fn post<'a>(&'a self, url: &'a str, headers: &'a Headers, body: Bytes)
        -> BoxFuture<'a, Result<Bytes>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post<'a>(
        &'a self,
        url: &'a str,
        headers: &'a Headers,
        body: Bytes,
    ) -> BoxFuture<'a, Result<Bytes>> {
        (**self).post(url, headers, body)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post<'a>(
        &'a self,
        url: &'a str,
        headers: &'a Headers,
        body: Bytes,
    ) -> BoxFuture<'a, Result<Bytes>> {
        (**self).post(url, headers, body)
    }
}
