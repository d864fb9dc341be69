//! # grpcweb-client
//!
//! Rust client for gRPC-Web unary calls in text mode.
//!
//! Messages are described at runtime by [`schema::MessageType`] descriptors
//! and encoded with a small protobuf wire codec (INT32 and STRING fields,
//! nested messages, optional fields with defaults).
//!
//! ## Architecture
//!
//! - **Codec**: varints, tags and schema-driven message encode/decode
//! - **Protocol**: 5-byte gRPC-Web frames and `key: value` trailer blocks
//! - **Call**: base64 body, protocol headers, one POST through a [`Transport`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grpcweb_client::schema::{Message, MessageType, PrimitiveType};
//! use grpcweb_client::{CallOptions, Client, ServiceDefinition};
//!
//! #[tokio::main]
//! async fn main() -> grpcweb_client::Result<()> {
//!     let request = Arc::new(
//!         MessageType::builder()
//!             .field(1, "name", PrimitiveType::String)
//!             .build()?,
//!     );
//!     let reply = Arc::new(
//!         MessageType::builder()
//!             .field(1, "message", PrimitiveType::String)
//!             .build()?,
//!     );
//!     let greeter = ServiceDefinition::new("helloworld.Greeter").method("SayHello", request, reply);
//!
//!     let client = Client::builder("http://localhost:8080").build()?;
//!     let response = client
//!         .call(&greeter, "SayHello", &Message::new().with("name", "world"), &CallOptions::new())
//!         .await?;
//!
//!     println!("{:?}", response.message.get_str("message"));
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod call;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod schema;
pub mod service;
pub mod transport;

mod client;

pub use adapter::SchemaProvider;
pub use call::{unary_call, CallResponse, CallState, UnaryCall};
pub use client::{CallOptions, Client, ClientBuilder, DEFAULT_MAX_FRAME_SIZE};
pub use error::{GrpcWebError, Result};
pub use protocol::Trailers;
pub use schema::{Message, MessageType, Value};
pub use service::{MethodDescriptor, ServiceDefinition};
pub use transport::{Headers, HttpTransport, Transport};
