//! Shared test utilities for stencil-gen tests.
//!
//! Provides the two fixture models used across the unit tests and the
//! helpers that check `quote!` output.

use proc_macro2::TokenStream;
use stencil_define::{
    EnumValue, HttpMethod, HttpTrait, Member, Model, Operation, Protocol, Service, Shape, ShapeId,
    Trait,
};

fn id(name: &str) -> ShapeId {
    ShapeId::new("test", name)
}

fn prelude(name: &str) -> ShapeId {
    ShapeId::prelude(name)
}

/// A REST-style service `test#Things` with three operations.
///
/// - `GetThing` - `GET /things/{thingId}`, a single label member
/// - `UpdateThing` - `PUT /things/{thingId}` with label, query, header,
///   and body members
/// - `Ping` - no input, no output, no HTTP binding
pub fn make_rest_model() -> Model {
    let shapes = vec![
        Shape::list(id("Tags"), Member::required("member", prelude("String"))),
        Shape::structure(
            id("Thing"),
            vec![
                Member::required("thingId", prelude("String")),
                Member::optional("name", prelude("String")),
                Member::optional("tags", id("Tags")),
                Member::optional("createdAt", prelude("Timestamp")),
            ],
        ),
        Shape::structure(
            id("GetThingInput"),
            vec![Member::required("thingId", prelude("String")).with_trait(Trait::HttpLabel)],
        ),
        Shape::structure(
            id("UpdateThingInput"),
            vec![
                Member::required("thingId", prelude("String")).with_trait(Trait::HttpLabel),
                Member::optional("tags", id("Tags")).with_trait(Trait::HttpQuery("tag".to_string())),
                Member::required("requestId", prelude("String"))
                    .with_trait(Trait::HttpHeader("X-Request-Id".to_string())),
                Member::optional("name", prelude("String")),
            ],
        ),
    ];
    let operations = vec![
        Operation::new(id("GetThing"))
            .with_input(id("GetThingInput"))
            .with_output(id("Thing"))
            .with_http(HttpTrait::new(HttpMethod::Get, "/things/{thingId}"))
            .with_documentation("Fetches one thing."),
        Operation::new(id("UpdateThing"))
            .with_input(id("UpdateThingInput"))
            .with_output(id("Thing"))
            .with_http(HttpTrait::new(HttpMethod::Put, "/things/{thingId}")),
        Operation::new(id("Ping")),
    ];
    let service = Service::new(id("Things"), "2024-01-01")
        .with_operation(id("GetThing"))
        .with_operation(id("UpdateThing"))
        .with_operation(id("Ping"))
        .with_protocol(Protocol::RestJson1);

    build(shapes, operations, service)
}

/// An RPC-style service `test#Catalog` with one `ListItems` operation.
pub fn make_rpc_model() -> Model {
    let shapes = vec![
        Shape::enumeration(
            id("Category"),
            vec![
                EnumValue::new("BOOKS", "books"),
                EnumValue::new("MUSIC", "music"),
            ],
        ),
        Shape::map(
            id("AttributeMap"),
            Member::required("key", prelude("String")),
            Member::required("value", prelude("String")),
        ),
        Shape::structure(
            id("Item"),
            vec![
                Member::required("id", prelude("String")),
                Member::optional("price", prelude("Double")),
                Member::optional("attributes", id("AttributeMap")),
            ],
        ),
        Shape::list(id("ItemList"), Member::required("member", id("Item"))),
        Shape::structure(
            id("ListItemsInput"),
            vec![
                Member::optional("category", id("Category")),
                Member::optional("limit", prelude("Integer")),
            ],
        ),
        Shape::structure(
            id("ListItemsOutput"),
            vec![
                Member::optional("items", id("ItemList")),
                Member::optional("nextToken", prelude("String")),
            ],
        ),
    ];
    let operations = vec![
        Operation::new(id("ListItems"))
            .with_input(id("ListItemsInput"))
            .with_output(id("ListItemsOutput")),
    ];
    let service = Service::new(id("Catalog"), "2024-01-01")
        .with_operation(id("ListItems"))
        .with_protocol(Protocol::AwsJson1_1);

    build(shapes, operations, service)
}

fn build(shapes: Vec<Shape>, operations: Vec<Operation>, service: Service) -> Model {
    let mut model = Model::with_prelude();
    for shape in shapes {
        model.insert_shape(shape).expect("fixture shape ids are unique");
    }
    for operation in operations {
        model
            .insert_operation(operation)
            .expect("fixture operation ids are unique");
    }
    model
        .insert_service(service)
        .expect("fixture service id is unique");
    model
}

/// Validates that generated code is syntactically correct.
///
/// ## Errors
///
/// Returns an error string if the generated code fails to parse.
pub fn validate_generated_code(tokens: &TokenStream) -> Result<(), String> {
    syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(())
}

/// Formats generated code using prettyplease.
///
/// ## Errors
///
/// Returns an error string if the code fails to parse.
pub fn format_generated_code(tokens: &TokenStream) -> Result<String, String> {
    let file = syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(prettyplease::unparse(&file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_model;

    #[test]
    fn rest_model_is_valid() {
        let model = make_rest_model();
        assert!(validate_model(&model, &id("Things")).is_ok());
        assert_eq!(model.service(&id("Things")).unwrap().operations.len(), 3);
    }

    #[test]
    fn rpc_model_is_valid() {
        let model = make_rpc_model();
        assert!(validate_model(&model, &id("Catalog")).is_ok());
        assert_eq!(
            model.service(&id("Catalog")).unwrap().protocol,
            Some(Protocol::AwsJson1_1)
        );
    }

    #[test]
    fn format_rejects_invalid_tokens() {
        let tokens: TokenStream = "pub struct".parse().unwrap();
        assert!(format_generated_code(&tokens).is_err());
        assert!(validate_generated_code(&tokens).is_err());
    }
}
