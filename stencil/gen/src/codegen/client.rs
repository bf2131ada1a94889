//! Generation of the `client` module.
//!
//! For a service named `Weather` this emits:
//!
//! - `WeatherApi`, a trait with one method per operation
//! - `WeatherClient`, the default implementation, holding the `Config` and
//!   a boxed `Transport`
//!
//! Each method builds an `OperationStack` from the protocol's middleware
//! registry, binds the input to an `HttpRequest`, runs the stack, and
//! decodes the output.
//!
//! ```text
//! fn get_city(&self, input: &GetCityInput) -> Result<GetCityOutput, ClientError> {
//!     let mut stack = OperationStack::new("GetCity");
//!     stack.push(Step::Initialize, UserAgentMiddleware::new(..));
//!     ...
//!     let request = HttpRequest::new(Method::Get, format!("/cities/{}", city_id_label));
//!     let response = stack.handle(request, self.transport.as_ref())?;
//!     let body = response.json_body()?;
//!     Ok(GetCityOutput::decode(&body)?)
//! }
//! ```

use stencil_define::{Model, Operation, Service, Shape, ShapeId};
use tracing::debug;

use super::shape_codec::JsonShapeCodec;
use crate::errors::GeneratorError;
use crate::middleware::MiddlewareRegistry;
use crate::naming::{field_name, type_name};
use crate::protocol::{ProtocolGenerator, RequestContext};
use crate::symbol::SymbolProvider;
use crate::validation::resolve_shape;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Name of the generated API trait (`WeatherApi`).
pub fn api_trait_name(service: &Service) -> String {
    format!("{}Api", type_name(service.id.name()))
}

/// Name of the generated client struct (`WeatherClient`).
pub fn client_name(service: &Service) -> String {
    format!("{}Client", type_name(service.id.name()))
}

/// Input and output shapes of one operation.
struct OperationShapes<'m> {
    operation: &'m Operation,
    input: Option<&'m Shape>,
    output: Option<&'m Shape>,
}

fn operation_shapes<'m>(
    model: &'m Model,
    service: &Service,
    id: &ShapeId,
) -> Result<OperationShapes<'m>, GeneratorError> {
    let operation = model
        .operation(id)
        .ok_or_else(|| GeneratorError::UnresolvedShape {
            id: id.clone(),
            referenced_from: format!("service {}", service.id),
        })?;
    let input = operation
        .input
        .as_ref()
        .map(|i| resolve_shape(model, i, &format!("input of {}", id)))
        .transpose()?;
    let output = operation
        .output
        .as_ref()
        .map(|o| resolve_shape(model, o, &format!("output of {}", id)))
        .transpose()?;
    Ok(OperationShapes {
        operation,
        input,
        output,
    })
}

/// Method signature for an operation, without a trailing `;` or body.
fn signature(
    writer: &mut CodeWriter,
    symbols: &mut dyn SymbolProvider,
    shapes: &OperationShapes<'_>,
) -> Result<String, GeneratorError> {
    let name = field_name(shapes.operation.id.name());
    let input = match shapes.input {
        Some(shape) => {
            let symbol = symbols.symbol_for(&shape.id)?;
            writer.register_import(&symbol);
            format!(", input: &{}", symbol.name)
        }
        None => String::new(),
    };
    let output = match shapes.output {
        Some(shape) => {
            let symbol = symbols.symbol_for(&shape.id)?;
            writer.register_import(&symbol);
            symbol.name.clone()
        }
        None => "()".to_string(),
    };
    Ok(format!(
        "fn {}(&self{}) -> Result<{}, ClientError>",
        name, input, output
    ))
}

/// Generates the `client` module for `service`.
///
/// ## Errors
///
/// Propagates resolution, middleware, and request-binding errors.
pub fn generate_client_module(
    model: &Model,
    service: &Service,
    protocol: &dyn ProtocolGenerator,
    symbols: &mut dyn SymbolProvider,
) -> Result<FinalizedUnit, GeneratorError> {
    let registry = protocol.middleware(service)?;
    let codec = JsonShapeCodec::new(model);
    let api = api_trait_name(service);
    let client = client_name(service);

    let mut writer = CodeWriter::new("crate::client");
    writer.write_module_doc(format!(
        "Client for the `{}` service (version {}, protocol {}).",
        service.id.name(),
        service.version,
        protocol.protocol()
    ));
    writer.import("crate::config", "Config");
    writer.import("crate::error", "ClientError");
    for name in ["HttpRequest", "OperationStack", "Step", "Transport"] {
        writer.import("crate::runtime", name);
    }
    for name in protocol.runtime_imports() {
        writer.import("crate::runtime", *name);
    }

    let operations = service
        .operations
        .iter()
        .map(|id| operation_shapes(model, service, id))
        .collect::<Result<Vec<_>, _>>()?;

    // API trait
    match &service.documentation {
        Some(docs) => writer.write_doc(docs),
        None => writer.write_doc(format!("Operations of the `{}` service.", service.id.name())),
    };
    writer.open_scope(format!("pub trait {} {{", api));
    for (index, shapes) in operations.iter().enumerate() {
        if index > 0 {
            writer.write_empty();
        }
        if let Some(docs) = &shapes.operation.documentation {
            writer.write_doc(docs);
        }
        let signature = signature(&mut writer, symbols, shapes)?;
        writer.write(format!("{};", signature));
    }
    writer.close_scope("}")?;
    writer.write_empty();

    // Client struct
    writer.write_doc(format!(
        "Default [`{}`] implementation sending requests through a [`Transport`].",
        api
    ));
    writer.open_scope(format!("pub struct {} {{", client));
    writer.write("config: Config,");
    writer.write("transport: Box<dyn Transport>,");
    writer.close_scope("}")?;
    writer.write_empty();

    writer.open_scope(format!("impl {} {{", client));
    writer.open_scope("pub fn new(config: Config, transport: impl Transport + 'static) -> Self {");
    writer.open_scope("Self {");
    writer.write("config,");
    writer.write("transport: Box::new(transport),");
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();
    writer.open_scope("pub fn config(&self) -> &Config {");
    writer.write("&self.config");
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();

    // Implementation
    writer.open_scope(format!("impl {} for {} {{", api, client));
    for (index, shapes) in operations.iter().enumerate() {
        if index > 0 {
            writer.write_empty();
        }
        render_operation(
            &mut writer,
            model,
            service,
            protocol,
            &registry,
            &codec,
            symbols,
            shapes,
        )?;
    }
    writer.close_scope("}")?;
    writer.write_empty();

    debug!(service = %service.id, operations = operations.len(), "generated client module");
    writer.finalize()
}

#[allow(clippy::too_many_arguments)]
fn render_operation(
    writer: &mut CodeWriter,
    model: &Model,
    service: &Service,
    protocol: &dyn ProtocolGenerator,
    registry: &MiddlewareRegistry,
    codec: &JsonShapeCodec<'_>,
    symbols: &mut dyn SymbolProvider,
    shapes: &OperationShapes<'_>,
) -> Result<(), GeneratorError> {
    let signature = signature(writer, symbols, shapes)?;
    writer.open_scope(format!("{} {{", signature));
    writer.write(format!(
        "let mut stack = OperationStack::new({:?});",
        shapes.operation.id.name()
    ));
    registry.render(writer, shapes.operation, "stack")?;

    let mut ctx = RequestContext {
        model,
        service,
        operation: shapes.operation,
        input: shapes.input,
        output: shapes.output,
        codec,
        symbols,
    };
    protocol.render_request(writer, &mut ctx)?;
    protocol.render_response(writer, &mut ctx)?;
    writer.close_scope("}")?;

    debug!(operation = %shapes.operation.id, "rendered operation");
    Ok(())
}
