//! Service definitions.
//!
//! A [`ServiceDefinition`] lists the methods of one remote service with their
//! request and response schemas. It is plain data: build it once, share it,
//! and hand it to [`Client::call`](crate::Client::call) for dispatch.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use grpcweb_client::schema::{MessageType, PrimitiveType};
//! use grpcweb_client::ServiceDefinition;
//!
//! let request = Arc::new(
//!     MessageType::builder()
//!         .field(1, "name", PrimitiveType::String)
//!         .build()
//!         .unwrap(),
//! );
//! let reply = Arc::new(
//!     MessageType::builder()
//!         .field(1, "message", PrimitiveType::String)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let service = ServiceDefinition::new("helloworld.Greeter")
//!     .method("SayHello", request, reply);
//!
//! assert_eq!(service.method_path("SayHello"), "/helloworld.Greeter/SayHello");
//! assert!(service.get_method("SayHello").is_some());
//! ```

use std::sync::Arc;

use crate::error::{GrpcWebError, Result};
use crate::schema::MessageType;

/// One unary method: name plus request/response schemas.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    request: Arc<MessageType>,
    response: Arc<MessageType>,
}

impl MethodDescriptor {
    pub fn new(name: &str, request: Arc<MessageType>, response: Arc<MessageType>) -> Self {
        Self {
            name: name.to_string(),
            request,
            response,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &MessageType {
        &self.request
    }

    pub fn response(&self) -> &MessageType {
        &self.response
    }
}

/// A named service and its methods, in registration order.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    name: String,
    methods: Vec<MethodDescriptor>,
}

impl ServiceDefinition {
    /// Create a service with no methods. `name` is the fully-qualified
    /// service name used in the URL path.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: Vec::new(),
        }
    }

    /// Register a method. Registering an existing name replaces it.
    pub fn method(
        mut self,
        name: &str,
        request: Arc<MessageType>,
        response: Arc<MessageType>,
    ) -> Self {
        let descriptor = MethodDescriptor::new(name, request, response);
        match self.methods.iter_mut().find(|m| m.name == name) {
            Some(existing) => *existing = descriptor,
            None => self.methods.push(descriptor),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn get_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Like [`get_method`](Self::get_method), failing with `UnknownMethod`.
    pub fn resolve(&self, name: &str) -> Result<&MethodDescriptor> {
        self.get_method(name)
            .ok_or_else(|| GrpcWebError::UnknownMethod {
                service: self.name.clone(),
                method: name.to_string(),
            })
    }

    /// URL path of a method: `/<service>/<method>`.
    pub fn method_path(&self, method: &str) -> String {
        format!("/{}/{}", self.name, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveType;

    fn schema(field: &str) -> Arc<MessageType> {
        Arc::new(
            MessageType::builder()
                .field(1, field, PrimitiveType::String)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_methods_keep_registration_order() {
        let service = ServiceDefinition::new("pkg.Svc")
            .method("B", schema("b"), schema("b"))
            .method("A", schema("a"), schema("a"));

        let names: Vec<&str> = service.methods().iter().map(MethodDescriptor::name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_reregistration_replaces() {
        let service = ServiceDefinition::new("pkg.Svc")
            .method("M", schema("old"), schema("old"))
            .method("M", schema("new"), schema("new"));

        assert_eq!(service.methods().len(), 1);
        let method = service.get_method("M").unwrap();
        assert!(method.request().field_by_name("new").is_some());
    }

    #[test]
    fn test_resolve_unknown_method() {
        let service = ServiceDefinition::new("pkg.Svc");
        match service.resolve("Missing") {
            Err(GrpcWebError::UnknownMethod { service, method }) => {
                assert_eq!(service, "pkg.Svc");
                assert_eq!(method, "Missing");
            }
            other => panic!("expected UnknownMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_method_path() {
        let service = ServiceDefinition::new("helloworld.Greeter");
        assert_eq!(service.method_path("SayHello"), "/helloworld.Greeter/SayHello");
    }
}
