//! Operations and services.
//!
//! - [`Service`] - a named, versioned set of operations bound to a [`Protocol`]
//! - [`Operation`] - one callable unit with optional input and output shapes
//! - [`HttpTrait`] - HTTP method and URI template for REST-style protocols

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::shape_id::ShapeId;

/// HTTP methods usable in an operation's [`HttpTrait`].
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use stencil_define::HttpMethod;
///
/// assert_eq!(HttpMethod::from_str("PUT").unwrap(), HttpMethod::Put);
/// assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

/// Wire protocol applied to a service.
///
/// The protocol decides request binding, content type, the middleware
/// stack, and the configuration fields of generated clients.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use stencil_define::Protocol;
///
/// assert_eq!(Protocol::from_str("restJson1").unwrap(), Protocol::RestJson1);
/// assert_eq!(Protocol::AwsJson1_1.to_string(), "awsJson1_1");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum Protocol {
    /// REST-style JSON: HTTP bindings on members, JSON payloads.
    #[serde(rename = "restJson1")]
    #[strum(serialize = "restJson1")]
    RestJson1,
    /// RPC-style JSON: every call is `POST /` with an `X-Amz-Target` header.
    #[serde(rename = "awsJson1_1")]
    #[strum(serialize = "awsJson1_1")]
    AwsJson1_1,
}

/// HTTP binding of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTrait {
    pub method: HttpMethod,
    /// URI template; `{label}` segments are filled from `httpLabel` members.
    pub uri: String,
}

impl HttpTrait {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }
}

/// A single callable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: ShapeId,
    #[serde(default)]
    pub input: Option<ShapeId>,
    #[serde(default)]
    pub output: Option<ShapeId>,
    #[serde(default)]
    pub http: Option<HttpTrait>,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Operation {
    pub fn new(id: ShapeId) -> Self {
        Self {
            id,
            input: None,
            output: None,
            http: None,
            documentation: None,
        }
    }

    pub fn with_input(mut self, input: ShapeId) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: ShapeId) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_http(mut self, http: HttpTrait) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_documentation(mut self, text: impl Into<String>) -> Self {
        self.documentation = Some(text.into());
        self
    }
}

/// A service: the root of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ShapeId,
    pub version: String,
    pub operations: Vec<ShapeId>,
    #[serde(default)]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Service {
    pub fn new(id: ShapeId, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
            operations: Vec::new(),
            protocol: None,
            documentation: None,
        }
    }

    pub fn with_operation(mut self, operation: ShapeId) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_documentation(mut self, text: impl Into<String>) -> Self {
        self.documentation = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn protocol_names_round_trip_through_serde() {
        for protocol in Protocol::iter() {
            let json = serde_json::to_string(&protocol).unwrap();
            assert_eq!(json, format!("\"{}\"", protocol));
            let back: Protocol = serde_json::from_str(&json).unwrap();
            assert_eq!(back, protocol);
        }
    }

    #[test]
    fn operation_builder_sets_all_fields() {
        let op = Operation::new(ShapeId::new("ex", "GetThing"))
            .with_input(ShapeId::new("ex", "GetThingInput"))
            .with_output(ShapeId::new("ex", "GetThingOutput"))
            .with_http(HttpTrait::new(HttpMethod::Get, "/things/{id}"))
            .with_documentation("Gets a thing");

        assert_eq!(op.input.unwrap().name(), "GetThingInput");
        assert_eq!(op.output.unwrap().name(), "GetThingOutput");
        assert_eq!(op.http.unwrap().uri, "/things/{id}");
        assert_eq!(op.documentation.as_deref(), Some("Gets a thing"));
    }

    #[test]
    fn service_parses_without_optional_fields() {
        let service: Service = serde_json::from_str(
            r#"{"id": "ex#Things", "version": "2024-01-01", "operations": ["ex#GetThing"]}"#,
        )
        .unwrap();
        assert_eq!(service.operations.len(), 1);
        assert!(service.protocol.is_none());
    }
}
