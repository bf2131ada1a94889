//! Stencil Code Generator
//!
//! Generates a Rust client crate from a service model.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use stencil_define::{Model, Protocol, ShapeId};
use stencil_definitions::{BUILTIN_NAMES, builtin};
use stencil_gen::errors::GeneratorError;
use stencil_gen::plugin::{DirectoryManifest, InMemoryManifest, PluginContext, Settings, execute};
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Stencil code generator - turns service models into typed Rust clients
#[derive(Parser, Debug)]
#[command(name = "stencil-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Built-in definition name (e.g. "weather") or path to a model JSON document
    #[arg(short, long, required_unless_present = "list_models")]
    model: Option<String>,

    /// Service to generate (e.g. "example.weather#Weather"); defaults to the only service in the model
    #[arg(short, long)]
    service: Option<ShapeId>,

    /// Override the protocol declared on the service ("restJson1" or "awsJson1_1")
    #[arg(short, long)]
    protocol: Option<Protocol>,

    /// Package name of the generated crate
    #[arg(long)]
    crate_name: Option<String>,

    /// Version of the generated crate
    #[arg(long, default_value = "0.1.0")]
    crate_version: String,

    /// Output directory for the generated crate
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// List the built-in definitions and exit
    #[arg(long)]
    list_models: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Initializes tracing on stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v`.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,stencil_gen=info".to_string(),
            2 => "info,stencil_gen=debug".to_string(),
            _ => "debug,stencil_gen=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Loads a built-in definition or a model document, returning the model and
/// the service the definition names (if any).
fn load_model(source: &str) -> Result<(Model, Option<ShapeId>), GeneratorError> {
    if let Some(definition) = builtin(source) {
        let definition = definition?;
        return Ok((definition.model, Some(definition.service)));
    }

    let path = Path::new(source);
    if !path.exists() {
        return Err(GeneratorError::ConfigError(format!(
            "Unknown model: '{}'. Available built-in models: {}; or pass a path to a model JSON file",
            source,
            BUILTIN_NAMES.join(", ")
        )));
    }
    let json = fs::read_to_string(path).map_err(|e| {
        GeneratorError::ConfigError(format!("cannot read model file '{}': {}", path.display(), e))
    })?;
    debug!(path = %path.display(), bytes = json.len(), "loaded model document");
    Ok((Model::from_json(&json)?, None))
}

/// Picks the service: explicit flag, then the definition's own, then the
/// model's only service.
fn select_service(
    model: &Model,
    requested: Option<ShapeId>,
    default: Option<ShapeId>,
) -> Result<ShapeId, GeneratorError> {
    if let Some(service) = requested.or(default) {
        return Ok(service);
    }
    let services: Vec<&ShapeId> = model.services().map(|s| &s.id).collect();
    match services.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Err(GeneratorError::ConfigError("the model defines no service".to_string())),
        many => Err(GeneratorError::ConfigError(format!(
            "the model defines {} services; choose one with --service: {}",
            many.len(),
            many.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

fn list_models() -> Result<(), GeneratorError> {
    for name in BUILTIN_NAMES {
        if let Some(definition) = builtin(name) {
            let definition = definition?;
            println!(
                "{:<10} {} ({})",
                name.bold(),
                definition.description,
                definition.service.to_string().dimmed()
            );
        }
    }
    Ok(())
}

fn main() -> Result<(), GeneratorError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_models {
        return list_models();
    }

    let source = cli.model.as_deref().unwrap_or_default();
    let (model, default_service) = load_model(source)?;
    let service = select_service(&model, cli.service.clone(), default_service)?;

    let mut settings = Settings::new(service).with_crate_version(cli.crate_version.clone());
    if let Some(name) = &cli.crate_name {
        settings = settings.with_crate_name(name.clone());
    }
    if let Some(protocol) = cli.protocol {
        settings = settings.with_protocol(protocol);
    }

    if cli.verbose > 0 {
        eprintln!("Generating {} for service {}", settings.crate_name, settings.service);
        if cli.dry_run {
            eprintln!("Dry run mode - no files will be written");
        }
    }

    if cli.dry_run {
        let mut manifest = InMemoryManifest::new();
        execute(&mut PluginContext {
            model: &model,
            settings: &settings,
            manifest: &mut manifest,
        })?;
        for (path, content) in manifest.iter() {
            println!("=== {} ===\n{}", path.display(), content);
        }
        return Ok(());
    }

    let mut manifest = DirectoryManifest::new(&cli.output);
    execute(&mut PluginContext {
        model: &model,
        settings: &settings,
        manifest: &mut manifest,
    })?;

    eprintln!(
        "{} {} ({} files) to {}",
        "Generated".green().bold(),
        settings.crate_name,
        manifest.written().len(),
        cli.output.display()
    );
    Ok(())
}
