//! End-to-end tests: generate client crates and verify they compile and run.
//!
//! These tests exercise the full pipeline from built-in definition to
//! compiled code. They are slower than unit tests since they invoke cargo.

use std::fs;
use std::path::Path;
use std::process::Command;

use stencil_definitions::{BUILTIN_NAMES, builtin};
use stencil_gen::plugin::{DirectoryManifest, PluginContext, Settings, execute};
use tempfile::TempDir;

/// Generates the named built-in into `dir`.
fn generate_into(name: &str, dir: &Path) {
    let definition = builtin(name).unwrap().unwrap();
    let settings = Settings::new(definition.service.clone());
    let mut manifest = DirectoryManifest::new(dir);
    execute(&mut PluginContext {
        model: &definition.model,
        settings: &settings,
        manifest: &mut manifest,
    })
    .expect("Failed to generate code");

    // Keep the generated crate out of any enclosing workspace.
    let cargo_toml = dir.join("Cargo.toml");
    let mut content = fs::read_to_string(&cargo_toml).unwrap();
    content.push_str("\n[workspace]\n");
    fs::write(&cargo_toml, content).unwrap();
}

fn cargo(dir: &Path, args: &[&str]) {
    let output = Command::new("cargo")
        .args(args)
        .arg("--manifest-path")
        .arg(dir.join("Cargo.toml"))
        .output()
        .expect("Failed to run cargo");

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!(
            "cargo {:?} failed:\n\nSTDOUT:\n{}\n\nSTDERR:\n{}",
            args, stdout, stderr
        );
    }
}

/// Tests that every built-in model generates a crate that compiles.
#[test]
#[ignore = "slow: compiles generated code"]
fn generated_crates_compile() {
    for name in BUILTIN_NAMES {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let crate_dir = temp_dir.path().join(name);
        generate_into(name, &crate_dir);
        cargo(&crate_dir, &["check"]);
    }
}

const WEATHER_ROUND_TRIP: &str = r##"
use std::sync::{Arc, Mutex};

use weather_client::model::{GetCityInput, ListCitiesInput};
use weather_client::runtime::{HttpRequest, HttpResponse, Method};
use weather_client::{ClientError, Config, WeatherApi, WeatherClient};

#[test]
fn get_city_sends_label_and_decodes_output() {
    let seen: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
    let recorder = Arc::clone(&seen);
    let client = WeatherClient::new(
        Config::new().with_endpoint("https://weather.test".to_string()),
        move |request: HttpRequest| -> Result<HttpResponse, ClientError> {
            recorder.lock().unwrap().push(request);
            Ok(HttpResponse::new(
                200,
                r#"{"cityId":"paris","name":"Paris","coordinates":{"latitude":48.8,"longitude":2.3}}"#,
            ))
        },
    );

    let city = client
        .get_city(&GetCityInput { city_id: "paris/1".to_string() })
        .unwrap();
    assert_eq!(city.name, "Paris");
    assert_eq!(city.population, None);

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].uri(), "https://weather.test/cities/paris%2F1");
}

#[test]
fn query_members_are_skipped_when_absent() {
    let seen: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
    let recorder = Arc::clone(&seen);
    let client = WeatherClient::new(Config::new(), move |request: HttpRequest| -> Result<HttpResponse, ClientError> {
        recorder.lock().unwrap().push(request);
        Ok(HttpResponse::new(200, r#"{"items":[]}"#))
    });

    let output = client
        .list_cities(&ListCitiesInput { next_token: None, page_size: Some(5) })
        .unwrap();
    assert!(output.items.is_empty());
    assert_eq!(seen.lock().unwrap()[0].query, [("pageSize".to_string(), "5".to_string())]);
}

#[test]
fn server_errors_are_retried_then_reported() {
    let attempts: Arc<Mutex<u32>> = Arc::default();
    let counter = Arc::clone(&attempts);
    let client = WeatherClient::new(
        Config::new().with_max_attempts(2),
        move |_: HttpRequest| -> Result<HttpResponse, ClientError> {
            *counter.lock().unwrap() += 1;
            Ok(HttpResponse::new(503, "unavailable"))
        },
    );

    let err = client
        .get_city(&GetCityInput { city_id: "x".to_string() })
        .unwrap_err();
    assert!(matches!(err, ClientError::Service { status: 503, .. }), "got: {}", err);
    assert_eq!(*attempts.lock().unwrap(), 2);
}
"##;

/// Tests that a generated client runs against a stub transport.
#[test]
#[ignore = "slow: compiles and runs generated code"]
fn generated_weather_client_round_trips() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let crate_dir = temp_dir.path().join("weather");
    generate_into("weather", &crate_dir);

    fs::create_dir_all(crate_dir.join("tests")).unwrap();
    fs::write(crate_dir.join("tests/round_trip.rs"), WEATHER_ROUND_TRIP).unwrap();
    cargo(&crate_dir, &["test"]);
}

const STORAGE_ROUND_TRIP: &str = r##"
use serde_json::json;
use storage_client::model::{Folder, GetObjectOutput, ObjectSummary};

#[test]
fn wrapped_batches_of_sparse_blobs_round_trip() {
    let wire = json!({"key": "k", "chunks": {"batch": [["YQ=="], ["Yg==", "Yw=="]]}});
    let output = GetObjectOutput::decode(&wire).unwrap();
    assert_eq!(
        output.chunks,
        Some(vec![
            vec![Some(b"a".to_vec())],
            vec![Some(b"b".to_vec()), Some(b"c".to_vec())],
        ])
    );
    assert_eq!(output.data, None);
    assert_eq!(output.encode(), wire);
    assert_eq!(GetObjectOutput::decode(&output.encode()).unwrap(), output);
}

#[test]
fn sparse_nulls_survive_and_empty_differs_from_absent() {
    let wire = json!({"key": "k", "chunks": {"batch": [[null, "YQ=="], []]}});
    let output = GetObjectOutput::decode(&wire).unwrap();
    assert_eq!(output.chunks, Some(vec![vec![None, Some(b"a".to_vec())], vec![]]));
    assert_eq!(output.encode(), wire);

    let empty = GetObjectOutput::decode(&json!({"key": "k", "chunks": {}})).unwrap();
    assert_eq!(empty.chunks, Some(vec![]));
    let absent = GetObjectOutput::decode(&json!({"key": "k"})).unwrap();
    assert_eq!(absent.chunks, None);
}

#[test]
fn absent_optional_numbers_stay_absent() {
    let summary = ObjectSummary::decode(&json!({"key": "k"})).unwrap();
    assert_eq!(summary.size, None);
    assert_eq!(summary.encode(), json!({"key": "k"}));

    let sized = ObjectSummary::decode(&json!({"key": "k", "size": 0})).unwrap();
    assert_eq!(sized.size, Some(0));
    assert_eq!(sized.encode(), json!({"key": "k", "size": 0}));
}

#[test]
fn recursive_folders_round_trip() {
    let wire = json!({
        "name": "root",
        "children": {"folder": [{"name": "docs", "parent": {"name": "root"}}]}
    });
    let folder = Folder::decode(&wire).unwrap();
    let children = folder.children.as_ref().unwrap();
    assert_eq!(children[0].name, "docs");
    assert_eq!(children[0].parent.as_ref().unwrap().name, "root");
    assert_eq!(folder.encode(), wire);
}
"##;

/// Tests that nested, sparse, and wrapped collections round-trip at runtime.
#[test]
#[ignore = "slow: compiles and runs generated code"]
fn generated_storage_model_round_trips() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let crate_dir = temp_dir.path().join("storage");
    generate_into("storage", &crate_dir);

    fs::create_dir_all(crate_dir.join("tests")).unwrap();
    fs::write(crate_dir.join("tests/round_trip.rs"), STORAGE_ROUND_TRIP).unwrap();
    cargo(&crate_dir, &["test"]);
}
