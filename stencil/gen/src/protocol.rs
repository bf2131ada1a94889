//! Protocol generators.
//!
//! A protocol decides everything about an operation that is not the shape
//! codec itself: which middleware goes on the stack, how input members bind
//! to the HTTP request, the content type, and which fields the generated
//! `Config` carries. Each supported [`Protocol`] has one
//! [`ProtocolGenerator`] implementation, selected with
//! [`ProtocolExt::generator`].
//!
//! ## Supported protocols
//!
//! | Protocol     | Request                                              | Body                         |
//! |--------------|------------------------------------------------------|------------------------------|
//! | `restJson1`  | method/URI from the `http` trait, labels, query, headers | unbound members, or the payload |
//! | `awsJson1_1` | `POST /` with `X-Amz-Target: <Service>.<Operation>`  | the whole input              |

use stencil_define::{
    HasTraits, HttpMethod, HttpTrait, Member, Model, Operation, PrimitiveType, Protocol, Service,
    Shape, ShapeId, ShapeKind,
};
use tracing::warn;

use crate::codegen::coding_keys::{coding_keys_name, key_expr};
use crate::codegen::shape_codec::{CodecPath, JsonShapeCodec, ShapeCodec};
use crate::errors::GeneratorError;
use crate::middleware::{MiddlewareDescriptor, MiddlewareRegistry, MiddlewareStep, Position};
use crate::naming::{field_name, temp_base, type_name};
use crate::symbol::{MODEL_NAMESPACE, SymbolProvider};
use crate::validation::resolve_shape;
use crate::writer::CodeWriter;

/// One field of the generated `Config` struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
    pub name: String,
    /// Rust type, as source text.
    pub ty: String,
    /// Default expression, as source text.
    pub default: String,
    pub documentation: String,
}

impl ConfigField {
    pub fn new(
        name: impl Into<String>,
        ty: impl Into<String>,
        default: impl Into<String>,
        documentation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default: default.into(),
            documentation: documentation.into(),
        }
    }
}

/// Everything a protocol needs to bind one operation.
pub struct RequestContext<'a> {
    pub model: &'a Model,
    pub service: &'a Service,
    pub operation: &'a Operation,
    pub input: Option<&'a Shape>,
    pub output: Option<&'a Shape>,
    pub codec: &'a JsonShapeCodec<'a>,
    pub symbols: &'a mut dyn SymbolProvider,
}

/// Protocol-specific parts of client generation.
pub trait ProtocolGenerator {
    fn protocol(&self) -> Protocol;

    /// Content type of JSON request bodies.
    fn content_type(&self) -> &'static str;

    /// Fields of the generated `Config`, in declaration order.
    fn config_fields(&self) -> Vec<ConfigField>;

    /// Builds the middleware registry shared by every operation of `service`.
    ///
    /// ## Errors
    ///
    /// Propagates registration errors.
    fn middleware(&self, service: &Service) -> Result<MiddlewareRegistry, GeneratorError>;

    /// Runtime items the rendered middleware constructors refer to.
    fn runtime_imports(&self) -> &'static [&'static str];

    /// Emits statements that bind `input` to a new `request` local.
    ///
    /// ## Errors
    ///
    /// Returns `ConfigError` for bindings the protocol cannot express.
    fn render_request(
        &self,
        writer: &mut CodeWriter,
        ctx: &mut RequestContext<'_>,
    ) -> Result<(), GeneratorError>;

    /// Emits the call through the stack and the decoding of the response.
    fn render_response(
        &self,
        writer: &mut CodeWriter,
        ctx: &mut RequestContext<'_>,
    ) -> Result<(), GeneratorError> {
        match ctx.output {
            Some(output) => {
                writer.write("let response = stack.handle(request, self.transport.as_ref())?;");
                writer.write("let body = response.json_body()?;");
                writer.write(format!("Ok({}::decode(&body)?)", type_name(output.id.name())));
            }
            None => {
                writer.write("stack.handle(request, self.transport.as_ref())?;");
                writer.write("Ok(())");
            }
        }
        Ok(())
    }
}

/// Selects the generator for a protocol.
pub trait ProtocolExt {
    fn generator(self) -> Box<dyn ProtocolGenerator>;
}

impl ProtocolExt for Protocol {
    fn generator(self) -> Box<dyn ProtocolGenerator> {
        match self {
            Protocol::RestJson1 => Box::new(RestJson1Generator),
            Protocol::AwsJson1_1 => Box::new(AwsJson1_1Generator),
        }
    }
}

fn common_config_fields() -> Vec<ConfigField> {
    vec![
        ConfigField::new(
            "endpoint",
            "String",
            "String::from(\"http://localhost:8080\")",
            "Scheme and authority every request is sent to.",
        ),
        ConfigField::new(
            "user_agent",
            "String",
            "String::from(concat!(env!(\"CARGO_PKG_NAME\"), \"/\", env!(\"CARGO_PKG_VERSION\")))",
            "Value of the `User-Agent` header.",
        ),
        ConfigField::new(
            "max_attempts",
            "u32",
            "3",
            "Attempts per call, including the first, for retryable failures.",
        ),
    ]
}

/// Registers the middleware every protocol shares.
fn register_common(
    registry: &mut MiddlewareRegistry,
    content_type: &str,
) -> Result<(), GeneratorError> {
    registry.register(MiddlewareDescriptor::push(
        "UserAgent",
        MiddlewareStep::Initialize,
        "UserAgentMiddleware::new(self.config.user_agent.clone())",
    ))?;
    registry.register(MiddlewareDescriptor::push(
        "ContentType",
        MiddlewareStep::Serialize,
        format!("ContentTypeMiddleware::new({:?})", content_type),
    ))?;
    registry.register(
        MiddlewareDescriptor::push(
            "Endpoint",
            MiddlewareStep::Build,
            "EndpointMiddleware::new(self.config.endpoint.clone())",
        )
        .with_position(Position::Head),
    )?;
    registry.register(
        MiddlewareDescriptor::push(
            "ContentLength",
            MiddlewareStep::Build,
            "ContentLengthMiddleware::new()",
        )
        .with_position(Position::After("Endpoint".to_string())),
    )?;
    registry.register(
        MiddlewareDescriptor::push(
            "Retry",
            MiddlewareStep::Finalize,
            "RetryMiddleware::new(self.config.max_attempts)",
        )
        .with_position(Position::Head),
    )?;
    registry.register(MiddlewareDescriptor::push(
        "StatusCheck",
        MiddlewareStep::Deserialize,
        "StatusCheckMiddleware::new()",
    ))?;
    Ok(())
}

/// REST-style JSON over HTTP bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestJson1Generator;

impl ProtocolGenerator for RestJson1Generator {
    fn protocol(&self) -> Protocol {
        Protocol::RestJson1
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        let mut fields = common_config_fields();
        fields.push(ConfigField::new(
            "api_token",
            "Option<String>",
            "None",
            "Bearer token sent in the `Authorization` header, if set.",
        ));
        fields
    }

    fn middleware(&self, service: &Service) -> Result<MiddlewareRegistry, GeneratorError> {
        let mut registry = MiddlewareRegistry::new(service.id.name());
        register_common(&mut registry, self.content_type())?;
        registry.register(
            MiddlewareDescriptor::push(
                "BearerAuth",
                MiddlewareStep::Finalize,
                "BearerAuthMiddleware::new(self.config.api_token.clone())",
            )
            .with_position(Position::After("Retry".to_string())),
        )?;
        Ok(registry)
    }

    fn runtime_imports(&self) -> &'static [&'static str] {
        &[
            "BearerAuthMiddleware",
            "ContentLengthMiddleware",
            "ContentTypeMiddleware",
            "EndpointMiddleware",
            "RetryMiddleware",
            "StatusCheckMiddleware",
            "UserAgentMiddleware",
        ]
    }

    fn render_request(
        &self,
        writer: &mut CodeWriter,
        ctx: &mut RequestContext<'_>,
    ) -> Result<(), GeneratorError> {
        let http = ctx.operation.http.clone().unwrap_or_else(|| {
            HttpTrait::new(HttpMethod::Post, format!("/{}", ctx.operation.id.name()))
        });
        let (path, literal_query) = match http.uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (http.uri.as_str(), None),
        };
        let segments = parse_uri(path, &ctx.operation.id)?;

        let literal_pairs: Vec<&str> = literal_query
            .map(|query| query.split('&').filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        // Every non-label member becomes a query, header, or body write.
        let mutated = !literal_pairs.is_empty()
            || ctx
                .input
                .is_some_and(|input| input.members().iter().any(|m| !m.is_http_label()));

        let path_expr = render_labels(writer, ctx, &segments)?;
        writer.import("crate::runtime", "Method");
        writer.write(format!(
            "let {} = HttpRequest::new(Method::{:?}, {});",
            if mutated { "mut request" } else { "request" },
            http.method,
            path_expr
        ));

        for pair in literal_pairs {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            writer.write(format!("request.add_query({:?}, {:?});", name, value));
        }

        let Some(input) = ctx.input else {
            return Ok(());
        };

        let mut bound = Vec::new();
        let mut payload = None;
        for member in input.members() {
            if member.is_http_label() {
                bound.push(member);
            } else if let Some(name) = member.http_query() {
                render_query(writer, ctx, input, member, name)?;
                bound.push(member);
            } else if let Some(name) = member.http_header() {
                render_header(writer, ctx, input, member, name)?;
                bound.push(member);
            } else if member.is_http_payload() {
                payload = Some(member);
            }
        }

        if let Some(member) = payload {
            return render_payload(writer, ctx, input, member);
        }

        if bound.len() == input.members().len() {
            return Ok(());
        }
        if bound.is_empty() {
            writer.write("request.set_json_body(&input.encode())?;");
            return Ok(());
        }

        writer.import(MODEL_NAMESPACE, coding_keys_name(input));
        writer.write("let mut body = input.encode();");
        writer.open_scope("if let serde_json::Value::Object(fields) = &mut body {");
        for member in &bound {
            writer.write(format!("fields.remove({});", key_expr(input, member)));
        }
        writer.close_scope("}")?;
        writer.write("request.set_json_body(&body)?;");
        Ok(())
    }
}

/// RPC-style JSON: every call is `POST /`, routed by a target header.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsJson1_1Generator;

impl ProtocolGenerator for AwsJson1_1Generator {
    fn protocol(&self) -> Protocol {
        Protocol::AwsJson1_1
    }

    fn content_type(&self) -> &'static str {
        "application/x-amz-json-1.1"
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        let mut fields = common_config_fields();
        fields.push(ConfigField::new(
            "region",
            "String",
            "String::from(\"us-east-1\")",
            "Region sent in the `X-Amz-Region` header.",
        ));
        fields
    }

    fn middleware(&self, service: &Service) -> Result<MiddlewareRegistry, GeneratorError> {
        let mut registry = MiddlewareRegistry::new(service.id.name());
        register_common(&mut registry, self.content_type())?;
        registry.register(
            MiddlewareDescriptor::push(
                "Target",
                MiddlewareStep::Serialize,
                format!(
                    "HeaderMiddleware::new(\"X-Amz-Target\", \"{}.{{operation}}\")",
                    service.id.name()
                ),
            )
            .with_position(Position::After("ContentType".to_string())),
        )?;
        registry.register(
            MiddlewareDescriptor::push(
                "Region",
                MiddlewareStep::Finalize,
                "HeaderMiddleware::new(\"X-Amz-Region\", self.config.region.clone())",
            )
            .with_position(Position::After("Retry".to_string())),
        )?;
        Ok(registry)
    }

    fn runtime_imports(&self) -> &'static [&'static str] {
        &[
            "ContentLengthMiddleware",
            "ContentTypeMiddleware",
            "EndpointMiddleware",
            "HeaderMiddleware",
            "RetryMiddleware",
            "StatusCheckMiddleware",
            "UserAgentMiddleware",
        ]
    }

    fn render_request(
        &self,
        writer: &mut CodeWriter,
        ctx: &mut RequestContext<'_>,
    ) -> Result<(), GeneratorError> {
        if ctx.operation.http.is_some() {
            warn!(operation = %ctx.operation.id, "ignoring http trait under awsJson1_1");
        }
        writer.import("crate::runtime", "Method");
        writer.write("let mut request = HttpRequest::new(Method::Post, \"/\");");
        if ctx.input.is_some() {
            writer.write("request.set_json_body(&input.encode())?;");
        } else {
            writer.write(
                "request.set_json_body(&serde_json::Value::Object(serde_json::Map::new()))?;",
            );
        }
        Ok(())
    }
}

/// A piece of a URI path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UriSegment {
    Literal(String),
    Label { name: String, greedy: bool },
}

/// Splits `/cities/{cityId}/forecast` into literals and labels.
fn parse_uri(template: &str, operation: &ShapeId) -> Result<Vec<UriSegment>, GeneratorError> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(UriSegment::Literal(rest[..open].to_string()));
        }
        let close = rest[open..].find('}').ok_or_else(|| {
            GeneratorError::ConfigError(format!(
                "unterminated label in URI '{}' of {}",
                template, operation
            ))
        })? + open;
        let label = &rest[open + 1..close];
        let (name, greedy) = match label.strip_suffix('+') {
            Some(name) => (name, true),
            None => (label, false),
        };
        if name.is_empty() {
            return Err(GeneratorError::ConfigError(format!(
                "empty label in URI '{}' of {}",
                template, operation
            )));
        }
        segments.push(UriSegment::Label {
            name: name.to_string(),
            greedy,
        });
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(UriSegment::Literal(rest.to_string()));
    }
    Ok(segments)
}

/// Binds every label and returns the expression for the request path.
fn render_labels(
    writer: &mut CodeWriter,
    ctx: &mut RequestContext<'_>,
    segments: &[UriSegment],
) -> Result<String, GeneratorError> {
    let mut template = String::new();
    let mut literal = String::new();
    let mut args = Vec::new();

    for segment in segments {
        match segment {
            UriSegment::Literal(text) => {
                literal.push_str(text);
                template.push_str(&text.replace('{', "{{").replace('}', "}}"));
            }
            UriSegment::Label { name, greedy } => {
                let unbound = || {
                    GeneratorError::ConfigError(format!(
                        "URI label '{}' of {} has no httpLabel input member",
                        name, ctx.operation.id
                    ))
                };
                let input = ctx.input.ok_or_else(unbound)?;
                let member = input
                    .members()
                    .iter()
                    .find(|m| &m.name == name && m.is_http_label())
                    .ok_or_else(unbound)?;
                let binding = format!("{}_label", temp_base(&member.name));
                let symbol = ctx.symbols.member_symbol(&input.id, member)?;

                if symbol.nullable {
                    let value = scalar_string(writer, ctx.model, &member.target, "value", true)?;
                    writer.open_scope(format!(
                        "let {} = match &input.{} {{",
                        binding,
                        field_name(&member.name)
                    ));
                    writer.write(format!("Some(value) => {},", encode_label(&value, *greedy)));
                    writer.write(format!(
                        "None => return Err(ClientError::InvalidRequest({:?}.to_string())),",
                        format!("missing URI label '{}'", member.name)
                    ));
                    writer.close_scope("};")?;
                } else {
                    let place = format!("input.{}", field_name(&member.name));
                    let value = scalar_string(writer, ctx.model, &member.target, &place, false)?;
                    writer.write(format!("let {} = {};", binding, encode_label(&value, *greedy)));
                }
                template.push_str("{}");
                args.push(binding);
            }
        }
    }

    if let Some(input) = ctx.input {
        for member in input.members().iter().filter(|m| m.is_http_label()) {
            let used = segments
                .iter()
                .any(|s| matches!(s, UriSegment::Label { name, .. } if name == &member.name));
            if !used {
                return Err(GeneratorError::ConfigError(format!(
                    "httpLabel member '{}' of {} does not appear in the URI",
                    member.name, input.id
                )));
            }
        }
    }

    if args.is_empty() {
        Ok(format!("{:?}", literal))
    } else {
        writer.import("crate::runtime", "percent_encode");
        Ok(format!("format!({:?}, {})", template, args.join(", ")))
    }
}

fn encode_label(value: &str, greedy: bool) -> String {
    if greedy {
        format!("percent_encode(&{}).replace(\"%2F\", \"/\")", value)
    } else {
        format!("percent_encode(&{})", value)
    }
}

/// Expression turning a scalar into a `String`.
///
/// `value` is a place of type `T` or, when `by_ref`, an expression of type `&T`.
fn scalar_string(
    writer: &mut CodeWriter,
    model: &Model,
    target: &ShapeId,
    value: &str,
    by_ref: bool,
) -> Result<String, GeneratorError> {
    let shape = resolve_shape(model, target, "HTTP binding")?;
    let reference = if by_ref {
        value.to_string()
    } else {
        format!("&{}", value)
    };
    match &shape.kind {
        ShapeKind::Primitive(PrimitiveType::Timestamp) => {
            writer.import("crate", "wire");
            Ok(format!("wire::encode_timestamp({}).to_string()", reference))
        }
        ShapeKind::Primitive(PrimitiveType::Blob) => {
            writer.import("crate", "wire");
            Ok(format!(
                "wire::encode_blob({}).as_str().unwrap_or_default().to_string()",
                reference
            ))
        }
        ShapeKind::Primitive(_) | ShapeKind::Enum { .. } => Ok(format!("{}.to_string()", value)),
        _ => Err(GeneratorError::ConfigError(format!(
            "{} cannot be bound to a URI, query, or header value",
            target
        ))),
    }
}

/// The element member and sparseness of a list or set target.
fn list_element<'m>(model: &'m Model, target: &ShapeId) -> Result<Option<(&'m Member, bool)>, GeneratorError> {
    let shape = resolve_shape(model, target, "HTTP binding")?;
    Ok(match &shape.kind {
        ShapeKind::List { member } | ShapeKind::Set { member } => Some((member, shape.is_sparse())),
        _ => None,
    })
}

/// Opens `if let Some(..)` for nullable members; returns the value
/// expression and whether it is a reference.
fn open_member(
    writer: &mut CodeWriter,
    ctx: &mut RequestContext<'_>,
    input: &Shape,
    member: &Member,
    role: &str,
) -> Result<(String, bool, bool), GeneratorError> {
    let symbol = ctx.symbols.member_symbol(&input.id, member)?;
    let field = field_name(&member.name);
    if symbol.nullable {
        let binding = format!("{}_{}", temp_base(&member.name), role);
        writer.open_scope(format!("if let Some({}) = &input.{} {{", binding, field));
        Ok((binding, true, true))
    } else {
        Ok((format!("input.{}", field), false, false))
    }
}

fn render_query(
    writer: &mut CodeWriter,
    ctx: &mut RequestContext<'_>,
    input: &Shape,
    member: &Member,
    name: &str,
) -> Result<(), GeneratorError> {
    let (value, by_ref, opened) = open_member(writer, ctx, input, member, "query")?;

    if let Some((element, sparse)) = list_element(ctx.model, &member.target)? {
        let item = format!("{}_item", temp_base(&member.name));
        let iter = if sparse {
            format!("{}.iter().flatten()", value)
        } else {
            format!("{}.iter()", value)
        };
        let text = scalar_string(writer, ctx.model, &element.target, &item, true)?;
        writer.open_scope(format!("for {} in {} {{", item, iter));
        writer.write(format!("request.add_query({:?}, {});", name, text));
        writer.close_scope("}")?;
    } else {
        let text = scalar_string(writer, ctx.model, &member.target, &value, by_ref)?;
        writer.write(format!("request.add_query({:?}, {});", name, text));
    }

    if opened {
        writer.close_scope("}")?;
    }
    Ok(())
}

fn render_header(
    writer: &mut CodeWriter,
    ctx: &mut RequestContext<'_>,
    input: &Shape,
    member: &Member,
    name: &str,
) -> Result<(), GeneratorError> {
    let (value, by_ref, opened) = open_member(writer, ctx, input, member, "header")?;

    if let Some((element, sparse)) = list_element(ctx.model, &member.target)? {
        let item = format!("{}_item", temp_base(&member.name));
        let values = format!("{}_values", temp_base(&member.name));
        let iter = if sparse {
            format!("{}.iter().flatten()", value)
        } else {
            format!("{}.iter()", value)
        };
        let text = scalar_string(writer, ctx.model, &element.target, &item, true)?;
        writer.write(format!(
            "let {}: Vec<String> = {}.map(|{}| {}).collect();",
            values, iter, item, text
        ));
        writer.write(format!("request.headers.insert({:?}, {}.join(\", \"));", name, values));
    } else {
        let text = scalar_string(writer, ctx.model, &member.target, &value, by_ref)?;
        writer.write(format!("request.headers.insert({:?}, {});", name, text));
    }

    if opened {
        writer.close_scope("}")?;
    }
    Ok(())
}

fn render_payload(
    writer: &mut CodeWriter,
    ctx: &mut RequestContext<'_>,
    input: &Shape,
    member: &Member,
) -> Result<(), GeneratorError> {
    let target = resolve_shape(ctx.model, &member.target, "HTTP payload")?;
    let symbol = ctx.symbols.member_symbol(&input.id, member)?;
    let field = field_name(&member.name);
    let mut path = CodecPath::new(&member.name);
    let present = path.local("present");

    if symbol.nullable {
        writer.open_scope(format!("if let Some({}) = &input.{} {{", present, field));
    }
    let (owned, reference) = if symbol.nullable {
        (format!("(*{})", present), present.clone())
    } else {
        (format!("input.{}", field), format!("&input.{}", field))
    };

    match &target.kind {
        ShapeKind::Structure { .. } | ShapeKind::Union { .. } => {
            writer.write(format!("request.set_json_body(&{}.encode())?;", owned));
        }
        ShapeKind::Primitive(PrimitiveType::Blob) => {
            writer.write("request.headers.insert(\"Content-Type\", \"application/octet-stream\");");
            writer.write(format!("request.body = {}.clone();", owned));
        }
        ShapeKind::Primitive(PrimitiveType::String) => {
            writer.write("request.headers.insert(\"Content-Type\", \"text/plain; charset=utf-8\");");
            writer.write(format!("request.body = {}.clone().into_bytes();", owned));
        }
        _ => {
            writer.import("crate", "wire");
            let wire = path.local("wire");
            ctx.codec
                .render_encode(writer, &member.target, &reference, &wire, &mut path)?;
            writer.write(format!("request.set_json_body(&{})?;", wire));
        }
    }

    if symbol.nullable {
        writer.close_scope("}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::RustSymbolProvider;
    use crate::test_utils::{make_rest_model, make_rpc_model};
    use stencil_define::Trait;

    fn render(model: &Model, service: &str, operation: &str, protocol: Protocol) -> String {
        let service = model.service(&ShapeId::new("test", service)).unwrap();
        let operation = model.operation(&ShapeId::new("test", operation)).unwrap();
        let codec = JsonShapeCodec::new(model);
        let mut symbols = RustSymbolProvider::new(model);
        let mut ctx = RequestContext {
            model,
            service,
            operation,
            input: operation.input.as_ref().and_then(|id| model.shape(id)),
            output: operation.output.as_ref().and_then(|id| model.shape(id)),
            codec: &codec,
            symbols: &mut symbols,
        };
        let mut writer = CodeWriter::new("crate::client");
        protocol
            .generator()
            .render_request(&mut writer, &mut ctx)
            .unwrap();
        writer.finalize().unwrap().source
    }

    #[test]
    fn rest_labels_are_percent_encoded() {
        let model = make_rest_model();
        let code = render(&model, "Things", "GetThing", Protocol::RestJson1);
        assert!(
            code.contains("let thing_id_label = percent_encode(&input.thing_id.to_string());"),
            "got:\n{}",
            code
        );
        assert!(
            code.contains("let request = HttpRequest::new(Method::Get, format!(\"/things/{}\", thing_id_label));"),
            "got:\n{}",
            code
        );
        assert!(code.contains("use crate::runtime::{Method, percent_encode};"), "got:\n{}", code);
    }

    #[test]
    fn rest_query_header_and_body_members_bind() {
        let model = make_rest_model();
        let code = render(&model, "Things", "UpdateThing", Protocol::RestJson1);
        assert!(code.contains("let mut request = HttpRequest::new(Method::Put,"), "got:\n{}", code);
        assert!(code.contains("for tags_item in tags_query.iter() {"), "got:\n{}", code);
        assert!(code.contains("request.add_query(\"tag\", tags_item.to_string());"), "got:\n{}", code);
        assert!(
            code.contains("request.headers.insert(\"X-Request-Id\", input.request_id.to_string());"),
            "got:\n{}",
            code
        );
        assert!(code.contains("let mut body = input.encode();"), "got:\n{}", code);
        assert!(
            code.contains("fields.remove(UpdateThingInputCodingKeys::ThingId.as_str());"),
            "got:\n{}",
            code
        );
        assert!(!code.contains("fields.remove(UpdateThingInputCodingKeys::Name.as_str());"));
        assert!(code.contains("request.set_json_body(&body)?;"), "got:\n{}", code);
    }

    #[test]
    fn rest_without_http_trait_posts_to_operation_name() {
        let model = make_rest_model();
        let code = render(&model, "Things", "Ping", Protocol::RestJson1);
        assert!(code.contains("let request = HttpRequest::new(Method::Post, \"/Ping\");"), "got:\n{}", code);
        assert!(!code.contains("set_json_body"), "got:\n{}", code);
    }

    #[test]
    fn unbound_uri_label_is_a_config_error() {
        let model = make_rest_model()
            .with_operation(
                Operation::new(ShapeId::new("test", "Broken"))
                    .with_http(HttpTrait::new(HttpMethod::Get, "/broken/{missing}")),
            )
            .unwrap();
        let operation = model.operation(&ShapeId::new("test", "Broken")).unwrap();
        let service = model.service(&ShapeId::new("test", "Things")).unwrap();
        let codec = JsonShapeCodec::new(&model);
        let mut symbols = RustSymbolProvider::new(&model);
        let mut ctx = RequestContext {
            model: &model,
            service,
            operation,
            input: None,
            output: None,
            codec: &codec,
            symbols: &mut symbols,
        };
        let mut writer = CodeWriter::new("crate::client");
        let err = RestJson1Generator
            .render_request(&mut writer, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::ConfigError(ref m) if m.contains("missing")));
    }

    #[test]
    fn greedy_labels_keep_slashes() {
        assert_eq!(
            parse_uri("/files/{path+}", &ShapeId::new("test", "Op")).unwrap(),
            vec![
                UriSegment::Literal("/files/".to_string()),
                UriSegment::Label {
                    name: "path".to_string(),
                    greedy: true
                },
            ]
        );
        assert_eq!(
            encode_label("key_value", true),
            "percent_encode(&key_value).replace(\"%2F\", \"/\")"
        );
    }

    #[test]
    fn rpc_posts_whole_input() {
        let model = make_rpc_model();
        let code = render(&model, "Catalog", "ListItems", Protocol::AwsJson1_1);
        assert!(code.contains("HttpRequest::new(Method::Post, \"/\");"), "got:\n{}", code);
        assert!(code.contains("request.set_json_body(&input.encode())?;"), "got:\n{}", code);
    }

    #[test]
    fn middleware_order_per_protocol() {
        let service = Service::new(ShapeId::new("test", "Catalog"), "1");
        let rest = RestJson1Generator.middleware(&service).unwrap();
        assert_eq!(
            rest.resolved_names().unwrap(),
            [
                "UserAgent",
                "ContentType",
                "Endpoint",
                "ContentLength",
                "Retry",
                "BearerAuth",
                "StatusCheck"
            ]
        );

        let rpc = AwsJson1_1Generator.middleware(&service).unwrap();
        assert_eq!(
            rpc.resolved_names().unwrap(),
            [
                "UserAgent",
                "ContentType",
                "Target",
                "Endpoint",
                "ContentLength",
                "Retry",
                "Region",
                "StatusCheck"
            ]
        );
    }

    #[test]
    fn target_header_names_service_and_operation() {
        let service = Service::new(ShapeId::new("test", "Catalog"), "1");
        let registry = AwsJson1_1Generator.middleware(&service).unwrap();
        let operation = Operation::new(ShapeId::new("test", "ListItems"));
        let mut writer = CodeWriter::new("crate::client");
        registry.render(&mut writer, &operation, "stack").unwrap();
        let code = writer.finalize().unwrap().source;
        assert!(
            code.contains("stack.push(Step::Serialize, HeaderMiddleware::new(\"X-Amz-Target\", \"Catalog.ListItems\"));"),
            "got:\n{}",
            code
        );
    }

    #[test]
    fn config_fields_differ_by_protocol() {
        let rest: Vec<String> = RestJson1Generator.config_fields().into_iter().map(|f| f.name).collect();
        let rpc: Vec<String> = AwsJson1_1Generator.config_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(rest, ["endpoint", "user_agent", "max_attempts", "api_token"]);
        assert_eq!(rpc, ["endpoint", "user_agent", "max_attempts", "region"]);
    }

    #[test]
    fn blob_payload_is_sent_raw() {
        let ns = "test";
        let model = Model::with_prelude()
            .with_shape(Shape::structure(
                ShapeId::new(ns, "UploadInput"),
                vec![
                    Member::required("key", ShapeId::prelude("String")).with_trait(Trait::HttpLabel),
                    Member::optional("data", ShapeId::prelude("Blob")).with_trait(Trait::HttpPayload),
                ],
            ))
            .unwrap()
            .with_operation(
                Operation::new(ShapeId::new(ns, "Upload"))
                    .with_input(ShapeId::new(ns, "UploadInput"))
                    .with_http(HttpTrait::new(HttpMethod::Put, "/objects/{key+}")),
            )
            .unwrap()
            .with_service(
                Service::new(ShapeId::new(ns, "Store"), "1")
                    .with_operation(ShapeId::new(ns, "Upload")),
            )
            .unwrap();

        let code = render(&model, "Store", "Upload", Protocol::RestJson1);
        assert!(code.contains("if let Some(data_present) = &input.data {"), "got:\n{}", code);
        assert!(code.contains("request.body = (*data_present).clone();"), "got:\n{}", code);
        assert!(code.contains(".replace(\"%2F\", \"/\")"), "got:\n{}", code);
    }
}
