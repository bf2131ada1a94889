//! Generation of the `runtime` module shipped inside every generated client.
//!
//! The runtime is protocol-independent:
//!
//! - `HttpRequest` / `HttpResponse` with a case-insensitive `Headers` map
//! - a blocking `Transport` trait the caller implements (or passes a closure)
//! - `Step`, `Middleware`, `Next` and `OperationStack`: the onion the
//!   generated client methods assemble per call
//! - the stock middleware the protocol generators register
//!
//! Middleware pushed onto an `OperationStack` is kept ordered by step;
//! within a step, push order is preserved. The first layer sees the request
//! first and the response last.

use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::GeneratorError;
use crate::symbol::Dependency;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Generates request/response types, headers, and the transport trait.
pub fn generate_http_types() -> TokenStream {
    quote! {
        /// HTTP request methods.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Method {
            Get,
            Post,
            Put,
            Patch,
            Delete,
            Head,
        }

        impl Method {
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::Get => "GET",
                    Self::Post => "POST",
                    Self::Put => "PUT",
                    Self::Patch => "PATCH",
                    Self::Delete => "DELETE",
                    Self::Head => "HEAD",
                }
            }
        }

        impl fmt::Display for Method {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Header multimap with case-insensitive names.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct Headers {
            entries: Vec<(String, String)>,
        }

        impl Headers {
            pub fn new() -> Self {
                Self::default()
            }

            /// Sets `name`, replacing every existing value.
            pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
                let name = name.into();
                self.remove(&name);
                self.entries.push((name, value.into()));
            }

            /// Adds a value, keeping existing ones.
            pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
                self.entries.push((name.into(), value.into()));
            }

            /// The first value of `name`.
            pub fn get(&self, name: &str) -> Option<&str> {
                self.entries
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.as_str())
            }

            pub fn get_all(&self, name: &str) -> Vec<&str> {
                self.entries
                    .iter()
                    .filter(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.as_str())
                    .collect()
            }

            pub fn contains(&self, name: &str) -> bool {
                self.get(name).is_some()
            }

            pub fn remove(&mut self, name: &str) {
                self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            }

            pub fn len(&self) -> usize {
                self.entries.len()
            }

            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
                self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
            }
        }

        /// An outgoing request.
        #[derive(Debug, Clone, PartialEq)]
        pub struct HttpRequest {
            pub method: Method,
            /// Scheme and authority, set by the endpoint middleware.
            pub endpoint: String,
            pub path: String,
            pub query: Vec<(String, String)>,
            pub headers: Headers,
            pub body: Vec<u8>,
        }

        impl HttpRequest {
            pub fn new(method: Method, path: impl Into<String>) -> Self {
                Self {
                    method,
                    endpoint: String::new(),
                    path: path.into(),
                    query: Vec::new(),
                    headers: Headers::new(),
                    body: Vec::new(),
                }
            }

            pub fn add_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
                self.query.push((name.into(), value.into()));
            }

            /// Serializes `value` as the request body.
            pub fn set_json_body(&mut self, value: &serde_json::Value) -> Result<(), ClientError> {
                self.body = serde_json::to_vec(value)?;
                Ok(())
            }

            /// Full URI: endpoint, path, and percent-encoded query string.
            pub fn uri(&self) -> String {
                let mut uri = format!("{}{}", self.endpoint.trim_end_matches('/'), self.path);
                if !self.query.is_empty() {
                    let pairs: Vec<String> = self
                        .query
                        .iter()
                        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
                        .collect();
                    uri.push('?');
                    uri.push_str(&pairs.join("&"));
                }
                uri
            }
        }

        /// A received response.
        #[derive(Debug, Clone, PartialEq)]
        pub struct HttpResponse {
            pub status: u16,
            pub headers: Headers,
            pub body: Vec<u8>,
        }

        impl HttpResponse {
            pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
                Self {
                    status,
                    headers: Headers::new(),
                    body: body.into(),
                }
            }

            pub fn is_success(&self) -> bool {
                (200..300).contains(&self.status)
            }

            /// Parses the body as JSON; an empty body is an empty object.
            pub fn json_body(&self) -> Result<serde_json::Value, ClientError> {
                if self.body.iter().all(u8::is_ascii_whitespace) {
                    return Ok(serde_json::Value::Object(serde_json::Map::new()));
                }
                Ok(serde_json::from_slice(&self.body)?)
            }
        }

        /// Percent-encodes everything outside the unreserved set.
        pub fn percent_encode(value: &str) -> String {
            let mut out = String::with_capacity(value.len());
            for byte in value.bytes() {
                match byte {
                    b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                        out.push(byte as char)
                    }
                    _ => out.push_str(&format!("%{:02X}", byte)),
                }
            }
            out
        }

        /// Sends requests. Implemented by the caller.
        pub trait Transport {
            fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
        }

        impl<F> Transport for F
        where
            F: Fn(HttpRequest) -> Result<HttpResponse, ClientError>,
        {
            fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
                self(request)
            }
        }
    }
}

/// Generates `Step`, `Middleware`, `Next`, and `OperationStack`.
pub fn generate_stack_types() -> TokenStream {
    quote! {
        /// Phases of an operation stack, in execution order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Step {
            Initialize,
            Serialize,
            Build,
            Finalize,
            Deserialize,
        }

        /// One layer of an operation stack.
        pub trait Middleware {
            fn name(&self) -> &'static str;

            /// Handles `request`, calling `next.run` to continue inward.
            fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError>;
        }

        /// The remaining layers and the transport.
        #[derive(Clone, Copy)]
        pub struct Next<'a> {
            layers: &'a [(Step, Box<dyn Middleware>)],
            transport: &'a dyn Transport,
        }

        impl<'a> Next<'a> {
            pub fn run(self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
                match self.layers.split_first() {
                    Some(((_, layer), rest)) => layer.handle(
                        request,
                        Next {
                            layers: rest,
                            transport: self.transport,
                        },
                    ),
                    None => self.transport.send(request),
                }
            }
        }

        /// The middleware for one operation call.
        pub struct OperationStack {
            operation: &'static str,
            layers: Vec<(Step, Box<dyn Middleware>)>,
        }

        impl OperationStack {
            pub fn new(operation: &'static str) -> Self {
                Self {
                    operation,
                    layers: Vec::new(),
                }
            }

            pub fn operation(&self) -> &'static str {
                self.operation
            }

            /// Adds a layer after every layer of the same or an earlier step.
            pub fn push(&mut self, step: Step, middleware: impl Middleware + 'static) {
                let index = self
                    .layers
                    .iter()
                    .position(|(s, _)| *s > step)
                    .unwrap_or(self.layers.len());
                self.layers.insert(index, (step, Box::new(middleware)));
            }

            /// Layer names, outermost first.
            pub fn names(&self) -> Vec<&'static str> {
                self.layers.iter().map(|(_, m)| m.name()).collect()
            }

            /// Runs `request` through every layer and the transport.
            pub fn handle(
                &self,
                request: HttpRequest,
                transport: &dyn Transport,
            ) -> Result<HttpResponse, ClientError> {
                Next {
                    layers: &self.layers,
                    transport,
                }
                .run(request)
            }
        }
    }
}

/// Generates the stock middleware registered by protocol generators.
pub fn generate_stock_middleware() -> TokenStream {
    quote! {
        /// Sets `User-Agent`.
        pub struct UserAgentMiddleware {
            value: String,
        }

        impl UserAgentMiddleware {
            pub fn new(value: impl Into<String>) -> Self {
                Self { value: value.into() }
            }
        }

        impl Middleware for UserAgentMiddleware {
            fn name(&self) -> &'static str {
                "UserAgent"
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                request.headers.insert("User-Agent", self.value.clone());
                next.run(request)
            }
        }

        /// Sets `Content-Type` on requests that carry a body.
        pub struct ContentTypeMiddleware {
            value: &'static str,
        }

        impl ContentTypeMiddleware {
            pub fn new(value: &'static str) -> Self {
                Self { value }
            }
        }

        impl Middleware for ContentTypeMiddleware {
            fn name(&self) -> &'static str {
                "ContentType"
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                if !request.body.is_empty() && !request.headers.contains("Content-Type") {
                    request.headers.insert("Content-Type", self.value);
                }
                next.run(request)
            }
        }

        /// Sets a fixed header.
        pub struct HeaderMiddleware {
            name: &'static str,
            value: String,
        }

        impl HeaderMiddleware {
            pub fn new(name: &'static str, value: impl Into<String>) -> Self {
                Self {
                    name,
                    value: value.into(),
                }
            }
        }

        impl Middleware for HeaderMiddleware {
            fn name(&self) -> &'static str {
                self.name
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                request.headers.insert(self.name, self.value.clone());
                next.run(request)
            }
        }

        /// Points the request at the configured endpoint.
        pub struct EndpointMiddleware {
            endpoint: String,
        }

        impl EndpointMiddleware {
            pub fn new(endpoint: impl Into<String>) -> Self {
                Self {
                    endpoint: endpoint.into(),
                }
            }
        }

        impl Middleware for EndpointMiddleware {
            fn name(&self) -> &'static str {
                "Endpoint"
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                request.endpoint = self.endpoint.clone();
                next.run(request)
            }
        }

        /// Sets `Content-Length` from the body.
        #[derive(Default)]
        pub struct ContentLengthMiddleware;

        impl ContentLengthMiddleware {
            pub fn new() -> Self {
                Self
            }
        }

        impl Middleware for ContentLengthMiddleware {
            fn name(&self) -> &'static str {
                "ContentLength"
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                request.headers.insert("Content-Length", request.body.len().to_string());
                next.run(request)
            }
        }

        /// Retries retryable failures of the inner layers.
        pub struct RetryMiddleware {
            max_attempts: u32,
        }

        impl RetryMiddleware {
            pub fn new(max_attempts: u32) -> Self {
                Self {
                    max_attempts: max_attempts.max(1),
                }
            }
        }

        impl Middleware for RetryMiddleware {
            fn name(&self) -> &'static str {
                "Retry"
            }

            fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                let mut attempt = 1;
                loop {
                    match next.run(request.clone()) {
                        Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                            attempt += 1;
                        }
                        result => return result,
                    }
                }
            }
        }

        /// Sets `Authorization: Bearer <token>` when a token is configured.
        pub struct BearerAuthMiddleware {
            token: Option<String>,
        }

        impl BearerAuthMiddleware {
            pub fn new(token: Option<String>) -> Self {
                Self { token }
            }
        }

        impl Middleware for BearerAuthMiddleware {
            fn name(&self) -> &'static str {
                "BearerAuth"
            }

            fn handle(&self, mut request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                if let Some(token) = &self.token {
                    request.headers.insert("Authorization", format!("Bearer {}", token));
                }
                next.run(request)
            }
        }

        /// Turns non-success responses into `ClientError::Service`.
        #[derive(Default)]
        pub struct StatusCheckMiddleware;

        impl StatusCheckMiddleware {
            pub fn new() -> Self {
                Self
            }
        }

        impl Middleware for StatusCheckMiddleware {
            fn name(&self) -> &'static str {
                "StatusCheck"
            }

            fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ClientError> {
                let response = next.run(request)?;
                if response.is_success() {
                    Ok(response)
                } else {
                    Err(ClientError::Service {
                        status: response.status,
                        body: String::from_utf8_lossy(&response.body).into_owned(),
                    })
                }
            }
        }
    }
}

/// Generates the `runtime` module.
pub fn generate_runtime_module() -> Result<FinalizedUnit, GeneratorError> {
    let mut writer = CodeWriter::new("crate::runtime");
    writer.write_module_doc("HTTP types, the transport seam, and the middleware stack.");
    writer.import("std", "fmt");
    writer.import("crate::error", "ClientError");
    writer.add_dependency(Dependency::serde_json());

    writer.write_tokens(generate_http_types());
    writer.write_tokens(generate_stack_types());
    writer.write_tokens(generate_stock_middleware());
    writer.finalize()
}
