//! Output assembly and file writing for generated code.
//!
//! This module handles the final phase of code generation: turning the
//! finalized units into formatted source files, assembling `lib.rs` and
//! `Cargo.toml`, and writing files to disk atomically.
//!
//! ## Output Structure
//!
//! ```text
//! <output>/
//! ├── Cargo.toml
//! └── src/
//!     ├── lib.rs       # Module declarations and re-exports
//!     ├── client.rs    # <Service>Api trait and <Service>Client
//!     ├── config.rs    # Config struct
//!     ├── error.rs     # ClientError
//!     ├── model.rs     # Model types with their codecs
//!     ├── runtime.rs   # HTTP types, Transport, middleware stack
//!     └── wire.rs      # DecodeError and codec helpers
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: every file is parsed with `syn` before anything is written
//! - **Formatting**: output is formatted with `prettyplease` for consistent style
//! - **No partial output**: the whole crate is generated in memory first
//! - **Atomic writes**: temp file + rename, so a file is never half-written

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use stencil_define::{Model, Service};
use tracing::{info, instrument};

use crate::codegen::{
    api_trait_name, client_name, generate_client_module, generate_config_module,
    generate_error_module, generate_manifest, generate_model_module, generate_runtime_module,
    generate_wire_module,
};
use crate::errors::GeneratorError;
use crate::plugin::Settings;
use crate::protocol::ProtocolExt;
use crate::symbol::{Dependency, RustSymbolProvider};
use crate::validation::{reachable_shapes, resolve_service, validate_model};
use crate::writer::{FinalizedUnit, GENERATED_MARKER};

/// A generated crate: relative path -> file content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedCrate {
    pub crate_name: String,
    pub files: BTreeMap<String, String>,
}

impl GeneratedCrate {
    /// Content of the file at `path` (e.g. `src/model.rs`).
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Validates generated code using syn.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the code fails to parse.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats a parsed file with prettyplease, prepending the generated-file marker.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!("{}\n\n{}", GENERATED_MARKER, formatted)
}

/// Parses and formats a finalized unit.
///
/// prettyplease drops plain comments, so the marker is re-prepended.
///
/// ## Errors
///
/// Returns `CodeGenError` naming the unit's namespace if it does not parse.
pub fn format_unit(unit: &FinalizedUnit) -> Result<String, GeneratorError> {
    let file = syn::parse_file(&unit.source).map_err(|e| {
        GeneratorError::CodeGenError(format!(
            "Generated module '{}' is invalid: {} (line {})",
            unit.namespace,
            e,
            e.span().start().line
        ))
    })?;
    Ok(format_code(&file))
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Assembles `lib.rs`: module declarations and the public re-exports.
pub fn assemble_lib_rs(service: &Service) -> TokenStream {
    let api = format_ident!("{}", api_trait_name(service));
    let client = format_ident!("{}", client_name(service));
    let title = format!(" Generated client for the `{}` service.", service.id.name());
    let version = format!(" Service version `{}`.", service.version);

    quote! {
        #![doc = #title]
        #![doc = ""]
        #![doc = #version]

        pub mod client;
        pub mod config;
        pub mod error;
        pub mod model;
        pub mod runtime;
        pub mod wire;

        pub use client::{#api, #client};
        pub use config::Config;
        pub use error::ClientError;
        pub use wire::DecodeError;
    }
}

/// Generates the whole client crate for `settings.service`, in memory.
///
/// ## Errors
///
/// Any validation, resolution, or generation error. Nothing is returned
/// unless every file was generated and parsed.
#[instrument(skip_all, fields(service = %settings.service))]
pub fn generate_crate(model: &Model, settings: &Settings) -> Result<GeneratedCrate, GeneratorError> {
    settings.validate()?;
    validate_model(model, &settings.service)?;
    let service = resolve_service(model, &settings.service)?;
    let protocol = settings.protocol.or(service.protocol).ok_or_else(|| {
        GeneratorError::ConfigError(format!(
            "service {} declares no protocol and none was configured",
            service.id
        ))
    })?;
    let generator = protocol.generator();
    let shapes = reachable_shapes(model, &service.id)?;
    let mut symbols = RustSymbolProvider::new(model);

    let model_unit = generate_model_module(model, &mut symbols, &shapes)?;
    let client_unit = generate_client_module(model, service, generator.as_ref(), &mut symbols)?;
    let with_blobs = model_unit.dependencies.contains(&Dependency::base64())
        || client_unit.dependencies.contains(&Dependency::base64());

    let units = [
        ("src/client.rs", client_unit),
        ("src/config.rs", generate_config_module(&generator.config_fields())?),
        ("src/error.rs", generate_error_module()?),
        ("src/model.rs", model_unit),
        ("src/runtime.rs", generate_runtime_module()?),
        ("src/wire.rs", generate_wire_module(with_blobs)?),
    ];

    let mut files = BTreeMap::new();
    let mut dependencies = BTreeSet::new();
    for (path, unit) in &units {
        dependencies.extend(unit.dependencies.iter().cloned());
        files.insert(path.to_string(), format_unit(unit)?);
        info!(file = path, "generated");
    }

    let lib = validate_code(&assemble_lib_rs(service))?;
    files.insert("src/lib.rs".to_string(), format_code(&lib));
    files.insert(
        "Cargo.toml".to_string(),
        generate_manifest(&settings.crate_name, &settings.crate_version, &dependencies)?,
    );

    info!(
        protocol = %protocol,
        shapes = shapes.len(),
        files = files.len(),
        "generated crate {}",
        settings.crate_name
    );
    Ok(GeneratedCrate {
        crate_name: settings.crate_name.clone(),
        files,
    })
}
