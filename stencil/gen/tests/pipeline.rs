//! Integration tests for the whole generation pipeline.
//!
//! Each test feeds a model through `generate_crate` or `execute` and checks
//! the generated files as text.

use std::fs;

use stencil_define::prelude::*;
use stencil_definitions::{BUILTIN_NAMES, builtin};
use stencil_gen::errors::GeneratorError;
use stencil_gen::output::{GeneratedCrate, generate_crate};
use stencil_gen::plugin::{DirectoryManifest, InMemoryManifest, PluginContext, Settings, execute};
use stencil_gen::writer::GENERATED_MARKER;
use tempfile::TempDir;

fn generate_builtin(name: &str) -> GeneratedCrate {
    let definition = builtin(name).unwrap().unwrap();
    generate_crate(&definition.model, &Settings::new(definition.service.clone()))
        .unwrap_or_else(|e| panic!("{} failed to generate: {}", name, e))
}

#[test]
fn builtin_models_generate_parseable_crates() {
    for name in BUILTIN_NAMES {
        let generated = generate_builtin(name);
        assert_eq!(generated.files.len(), 8, "{}", name);

        for (path, content) in &generated.files {
            if path.ends_with(".rs") {
                assert!(content.starts_with(GENERATED_MARKER), "{}: {} lacks marker", name, path);
                syn::parse_file(content)
                    .unwrap_or_else(|e| panic!("{}: {} is invalid: {}\n{}", name, path, e, content));
            }
        }
        let manifest: toml::Table = generated.file("Cargo.toml").unwrap().parse().unwrap();
        assert_eq!(
            manifest["package"]["name"].as_str(),
            Some(format!("{}-client", name).as_str())
        );
    }
}

#[test]
fn generation_is_deterministic() {
    for name in BUILTIN_NAMES {
        assert_eq!(generate_builtin(name), generate_builtin(name), "{}", name);
    }
}

#[test]
fn storage_model_boxes_recursion_and_nests_sparse_blobs() {
    let generated = generate_builtin("storage");
    let model = generated.file("src/model.rs").unwrap();

    assert!(model.contains("pub parent: Option<Box<Folder>>,"), "got:\n{}", model);
    assert!(model.contains("pub children: Option<Vec<Folder>>,"), "got:\n{}", model);
    assert!(
        model.contains("pub chunks: Option<Vec<Vec<Option<Vec<u8>>>>>,"),
        "got:\n{}",
        model
    );
    assert!(model.contains("\"batch\""), "wrapped key missing:\n{}", model);

    let manifest = generated.file("Cargo.toml").unwrap();
    assert!(manifest.contains("base64"), "got:\n{}", manifest);
    let wire = generated.file("src/wire.rs").unwrap();
    assert!(wire.contains("pub fn decode_blob"), "got:\n{}", wire);
}

#[test]
fn storage_client_sends_blob_payload_under_greedy_label() {
    let generated = generate_builtin("storage");
    let client = generated.file("src/client.rs").unwrap();
    assert!(client.contains("pub trait StorageApi {"), "got:\n{}", client);
    assert!(client.contains(".replace(\"%2F\", \"/\")"), "got:\n{}", client);
    assert!(client.contains("application/octet-stream"), "got:\n{}", client);
}

#[test]
fn catalog_model_has_open_enums_and_unions() {
    let generated = generate_builtin("catalog");
    let model = generated.file("src/model.rs").unwrap();
    assert!(model.contains("pub enum PriceTag {"), "got:\n{}", model);
    assert!(model.contains("pub enum Category {"), "got:\n{}", model);
    assert!(model.contains("impl From<&str> for Category {"), "got:\n{}", model);
    assert!(model.contains("Unknown(String),"), "got:\n{}", model);

    let client = generated.file("src/client.rs").unwrap();
    assert!(client.contains("\"Catalog.ListItems\""), "got:\n{}", client);
    assert!(!generated.file("Cargo.toml").unwrap().contains("base64"));
}

#[test]
fn weather_client_binds_http_members() {
    let generated = generate_builtin("weather");
    let client = generated.file("src/client.rs").unwrap();
    assert!(client.contains("request.add_query(\"pageSize\""), "got:\n{}", client);
    assert!(client.contains("\"X-Client-Token\""), "got:\n{}", client);
    assert!(client.contains("Method::Delete"), "got:\n{}", client);
    assert!(client.contains("fn delete_city(&self, input: &DeleteCityInput) -> Result<(), ClientError>"));

    let config = generated.file("src/config.rs").unwrap();
    assert!(config.contains("pub api_token: Option<String>,"), "got:\n{}", config);
}

#[test]
fn protocol_override_changes_config() {
    let definition = builtin("weather").unwrap().unwrap();
    let settings = Settings::new(definition.service.clone()).with_protocol(Protocol::AwsJson1_1);
    let generated = generate_crate(&definition.model, &settings).unwrap();
    let config = generated.file("src/config.rs").unwrap();
    assert!(config.contains("pub region: String,"), "got:\n{}", config);
    assert!(!config.contains("api_token"), "got:\n{}", config);
}

fn cyclic_model() -> Model {
    let ns = "test.cycle";
    Model::with_prelude()
        .with_shape(Shape::structure(
            ShapeId::new(ns, "A"),
            vec![Member::required("b", ShapeId::new(ns, "B"))],
        ))
        .unwrap()
        .with_shape(Shape::structure(
            ShapeId::new(ns, "B"),
            vec![Member::required("a", ShapeId::new(ns, "A"))],
        ))
        .unwrap()
        .with_operation(Operation::new(ShapeId::new(ns, "Loop")).with_input(ShapeId::new(ns, "A")))
        .unwrap()
        .with_service(
            Service::new(ShapeId::new(ns, "Cycle"), "1")
                .with_operation(ShapeId::new(ns, "Loop"))
                .with_protocol(Protocol::RestJson1),
        )
        .unwrap()
}

#[test]
fn required_cycle_is_rejected_and_nothing_is_written() {
    let temp_dir = TempDir::new().unwrap();
    let model = cyclic_model();
    let settings = Settings::new(ShapeId::new("test.cycle", "Cycle"));
    let mut manifest = DirectoryManifest::new(temp_dir.path());

    let err = execute(&mut PluginContext {
        model: &model,
        settings: &settings,
        manifest: &mut manifest,
    })
    .unwrap_err();

    assert!(matches!(err, GeneratorError::InvalidShapeGraph { .. }), "got: {}", err);
    assert!(err.to_string().contains("test.cycle#A"), "got: {}", err);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn optional_cycle_generates_boxed_members() {
    let ns = "test.tree";
    let model = Model::with_prelude()
        .with_shape(Shape::structure(
            ShapeId::new(ns, "Node"),
            vec![
                Member::required("value", ShapeId::prelude("Integer")),
                Member::optional("next", ShapeId::new(ns, "Node")),
            ],
        ))
        .unwrap()
        .with_operation(Operation::new(ShapeId::new(ns, "Walk")).with_output(ShapeId::new(ns, "Node")))
        .unwrap()
        .with_service(
            Service::new(ShapeId::new(ns, "Tree"), "1")
                .with_operation(ShapeId::new(ns, "Walk"))
                .with_protocol(Protocol::AwsJson1_1),
        )
        .unwrap();

    let generated = generate_crate(&model, &Settings::new(ShapeId::new(ns, "Tree"))).unwrap();
    let source = generated.file("src/model.rs").unwrap();
    assert!(source.contains("pub next: Option<Box<Node>>,"), "got:\n{}", source);
}

#[test]
fn execute_writes_the_same_files_as_a_dry_run() {
    let definition = builtin("catalog").unwrap().unwrap();
    let settings = Settings::new(definition.service.clone()).with_crate_name("shop-catalog");

    let mut memory = InMemoryManifest::new();
    execute(&mut PluginContext {
        model: &definition.model,
        settings: &settings,
        manifest: &mut memory,
    })
    .unwrap();

    let temp_dir = TempDir::new().unwrap();
    let mut directory = DirectoryManifest::new(temp_dir.path());
    execute(&mut PluginContext {
        model: &definition.model,
        settings: &settings,
        manifest: &mut directory,
    })
    .unwrap();

    assert_eq!(memory.len(), directory.written().len());
    for (path, content) in memory.iter() {
        let on_disk = fs::read_to_string(temp_dir.path().join(path)).unwrap();
        assert_eq!(on_disk, content, "{}", path.display());
    }
    assert!(memory.get("Cargo.toml").unwrap().contains("name = \"shop-catalog\""));
}
